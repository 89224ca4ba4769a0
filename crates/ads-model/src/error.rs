/// Domain-level error taxonomy for the ad delivery core.
///
/// These are plain enum variants rather than named sentinel error values:
/// the variant *is* the name. Every variant here can cross a reply-channel
/// boundary (it's `Clone` so a response envelope can be constructed without
/// consuming the originating error).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdError {
    /// The candidate set after targeting filters is empty.
    #[error("no ads found matching the given targeting criteria")]
    NoAdsFound,

    /// Pagination offset is negative or >= the total candidate count.
    #[error("offset {offset} is out of range for {total} matching ads")]
    OffsetOutOfRange { offset: i64, total: i64 },

    /// `ad.version` was not exactly `store.version + 1` on a single-ad
    /// create. During replay this is the recognized "already applied, skip"
    /// signal.
    #[error("invalid version: expected {expected}, got {got}")]
    InvalidVersion { expected: i64, got: i64 },

    /// Could not acquire the cross-replica write lock within the
    /// configured wait.
    #[error("could not acquire distributed lock {key:?} within the configured wait")]
    LockUnavailable { key: String },

    /// The relational transaction failed; the writer has rolled back.
    #[error("failed to persist ad: {reason}")]
    PersistFailed { reason: String },

    /// The event stream append failed; the relational transaction backing
    /// it has been rolled back.
    #[error("failed to append to event stream: {reason}")]
    StreamAppendFailed { reason: String },

    /// The service has begun shutdown; new requests are rejected
    /// immediately.
    #[error("service is shutting down")]
    ShuttingDown,

    /// A request's deadline elapsed before its reply arrived.
    #[error("request timed out waiting for a response")]
    Timeout,
}

impl AdError {
    /// True for the two `GetAds` outcomes a caller should treat as
    /// not-found rather than a server error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AdError::NoAdsFound | AdError::OffsetOutOfRange { .. })
    }
}
