use async_trait::async_trait;

use crate::error::Error;

/// One entry read back from an [`EventStream`]: an opaque, monotonically
/// ordered id and the raw payload passed to [`EventStream::append`].
#[derive(Debug, Clone)]
pub struct StreamEntry {
    pub id: String,
    pub payload: Vec<u8>,
}

/// The append-only change log a write pipeline publishes to after a commit,
/// and a fresh replica subscribes to from its last-known version exclusive
/// on boot.
///
/// Entry ids follow the `"0-<version>"` convention the original service
/// uses: the version is carried in the stream's own sequence component so
/// ordering by entry id and ordering by version coincide exactly.
#[async_trait]
pub trait EventStream: Send + Sync {
    /// Appends `payload` at `"0-<version>"`, returning the entry id.
    async fn append(&self, version: i64, payload: Vec<u8>) -> Result<String, Error>;

    /// Reads up to `limit` entries with a version strictly greater than
    /// `after_version`, oldest first.
    async fn read_from(&self, after_version: i64, limit: usize) -> Result<Vec<StreamEntry>, Error>;
}
