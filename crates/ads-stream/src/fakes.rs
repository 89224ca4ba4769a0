//! In-memory test doubles for [`crate::DistributedLock`] and
//! [`crate::EventStream`], so `ads-service`'s write-pipeline and replay logic
//! can be exercised in `#[tokio::test]`s without a live Redis.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Error;
use crate::lock::{DistributedLock, LockGuard};
use crate::stream::{EventStream, StreamEntry};

/// A lock that only one caller may hold at a time, enforced with a
/// process-local mutex keyed by lock name. TTL and wait are honored loosely:
/// a blocked `acquire` polls until `wait` elapses, matching the real Redis
/// lock's retry loop without needing a clock mock.
#[derive(Default)]
pub struct FakeDistributedLock {
    held: Arc<Mutex<HashMap<String, ()>>>,
}

impl FakeDistributedLock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DistributedLock for FakeDistributedLock {
    async fn acquire(&self, key: &str, _ttl: Duration, wait: Duration) -> Result<LockGuard, Error> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            {
                let mut held = self.held.lock().await;
                if !held.contains_key(key) {
                    held.insert(key.to_string(), ());
                    let held = self.held.clone();
                    let key = key.to_string();
                    return Ok(LockGuard::new(move || async move {
                        held.lock().await.remove(&key);
                        Ok(())
                    }));
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(Error::LockUnavailable {
                    key: key.to_string(),
                    waited_ms: wait.as_millis() as u64,
                });
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

/// An append-only in-memory stream keyed by the same `"0-<version>"` entry
/// id convention as [`crate::RedisEventStream`], so replay logic written
/// against the trait behaves identically against the fake.
#[derive(Default)]
pub struct FakeEventStream {
    entries: Arc<Mutex<Vec<StreamEntry>>>,
}

impl FakeEventStream {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStream for FakeEventStream {
    async fn append(&self, version: i64, payload: Vec<u8>) -> Result<String, Error> {
        let id = format!("0-{version}");
        self.entries.lock().await.push(StreamEntry {
            id: id.clone(),
            payload,
        });
        Ok(id)
    }

    async fn read_from(&self, after_version: i64, limit: usize) -> Result<Vec<StreamEntry>, Error> {
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .filter(|e| entry_version(&e.id) > after_version)
            .take(limit)
            .cloned()
            .collect())
    }
}

fn entry_version(id: &str) -> i64 {
    id.rsplit('-').next().and_then(|v| v.parse().ok()).unwrap_or(0)
}
