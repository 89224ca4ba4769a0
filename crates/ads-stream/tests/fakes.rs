use std::sync::Arc;
use std::time::Duration;

use ads_stream::{DistributedLock, EventStream, FakeDistributedLock, FakeEventStream};

#[tokio::test]
async fn lock_is_mutually_exclusive_until_released() {
    let lock = Arc::new(FakeDistributedLock::new());

    let guard = lock
        .acquire("ads-write", Duration::from_secs(5), Duration::from_millis(50))
        .await
        .expect("first acquire should succeed immediately");

    let second = lock
        .acquire("ads-write", Duration::from_secs(5), Duration::from_millis(20))
        .await;
    assert!(second.is_err(), "second acquire should time out while held");

    guard.release().await.unwrap();

    lock.acquire("ads-write", Duration::from_secs(5), Duration::from_millis(20))
        .await
        .expect("acquire should succeed once released");
}

#[tokio::test]
async fn stream_read_from_returns_only_entries_after_the_given_version() {
    let stream = FakeEventStream::new();
    stream.append(1, b"a".to_vec()).await.unwrap();
    stream.append(2, b"b".to_vec()).await.unwrap();
    stream.append(3, b"c".to_vec()).await.unwrap();

    let entries = stream.read_from(1, 10).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, "0-2");
    assert_eq!(entries[1].id, "0-3");
}

#[tokio::test]
async fn stream_read_from_respects_limit() {
    let stream = FakeEventStream::new();
    for v in 1..=5 {
        stream.append(v, vec![v as u8]).await.unwrap();
    }

    let entries = stream.read_from(0, 2).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, "0-1");
    assert_eq!(entries[1].id, "0-2");
}
