use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use uuid::Uuid;

use crate::error::Error;
use crate::lock::{DistributedLock, LockGuard};

/// Compare-and-delete release script: only the holder that set the token may
/// clear the key, so a lock that expired and was re-acquired by someone else
/// is never torn down out from under them. Mirrors the bsm/redislock Lua
/// script the original service uses for the same purpose.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

const RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// A [`DistributedLock`] backed by a Redis `SET key token NX PX ttl` /
/// compare-and-delete pair.
pub struct RedisDistributedLock {
    conn: ConnectionManager,
}

impl RedisDistributedLock {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl DistributedLock for RedisDistributedLock {
    async fn acquire(&self, key: &str, ttl: Duration, wait: Duration) -> Result<LockGuard, Error> {
        let token = Uuid::new_v4().to_string();
        let mut conn = self.conn.clone();
        let deadline = tokio::time::Instant::now() + wait;

        loop {
            let acquired: bool = redis::cmd("SET")
                .arg(key)
                .arg(&token)
                .arg("NX")
                .arg("PX")
                .arg(ttl.as_millis() as u64)
                .query_async(&mut conn)
                .await
                .map(|reply: Option<String>| reply.is_some())?;

            if acquired {
                let release_conn = self.conn.clone();
                let release_key = key.to_string();
                let release_token = token.clone();
                return Ok(LockGuard::new(move || async move {
                    release_lock(release_conn, &release_key, &release_token).await
                }));
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(Error::LockUnavailable {
                    key: key.to_string(),
                    waited_ms: wait.as_millis() as u64,
                });
            }

            tokio::time::sleep(RETRY_INTERVAL).await;
        }
    }
}

async fn release_lock(mut conn: ConnectionManager, key: &str, token: &str) -> Result<(), Error> {
    redis::Script::new(RELEASE_SCRIPT)
        .key(key)
        .arg(token)
        .invoke_async::<_, i64>(&mut conn)
        .await?;
    Ok(())
}
