/// Errors from the event stream and distributed lock.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("could not acquire lock {key:?} within {waited_ms}ms")]
    LockUnavailable { key: String, waited_ms: u64 },

    #[error("malformed stream entry {id}: {reason}")]
    MalformedEntry { id: String, reason: String },
}

impl From<Error> for ads_model::AdError {
    fn from(err: Error) -> Self {
        match err {
            Error::LockUnavailable { key, .. } => ads_model::AdError::LockUnavailable { key },
            other => ads_model::AdError::StreamAppendFailed {
                reason: other.to_string(),
            },
        }
    }
}
