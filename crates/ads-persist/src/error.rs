/// Errors from the relational write-of-record.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("row for ad {id} failed domain validation: {source}")]
    InvalidRow {
        id: String,
        #[source]
        source: ads_model::AdValidationError,
    },
}
