use std::time::Duration;

/// Tunables for [`crate::AdService`]'s write pipeline and replay subscriber
///. Construction lives in `ads-daemon`; this crate only consumes
/// the values.
#[derive(Debug, Clone)]
pub struct AdServiceConfig {
    /// Name of the cross-replica lock guarding the write critical section.
    pub lock_key: String,
    /// Redis stream key (or equivalent) ads are published to after commit.
    pub stream_key: String,
    /// Approximate cap on stream length (`XADD ... MAXLEN ~ n`).
    pub stream_maxlen: usize,
    /// How long an acquired lock is allowed to live before it auto-expires.
    pub lock_ttl: Duration,
    /// How long a writer waits to acquire the lock before giving up.
    pub lock_wait: Duration,
    /// Deadline for a `Runner` round trip -- callers own their deadlines.
    pub runner_call_timeout: Duration,
    /// How often the replay subscriber polls the event stream for new
    /// entries.
    pub replay_poll_interval: Duration,
    /// Max entries fetched per replay poll.
    pub replay_batch_size: usize,
}

impl Default for AdServiceConfig {
    fn default() -> Self {
        Self {
            lock_key: "ads:write-lock".to_string(),
            stream_key: "ads:events".to_string(),
            stream_maxlen: 100_000,
            lock_ttl: Duration::from_secs(5),
            lock_wait: Duration::from_secs(2),
            runner_call_timeout: Duration::from_secs(5),
            replay_poll_interval: Duration::from_millis(200),
            replay_batch_size: 500,
        }
    }
}
