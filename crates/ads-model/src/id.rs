use std::fmt;

/// Opaque, caller-assigned identifier for an [`crate::Ad`].
///
/// The core never generates ids itself; callers assign them, and the id
/// stays stable for the lifetime of the ad. Callers conventionally supply
/// UUIDs, but `AdId` places no format requirement on the string beyond
/// non-emptiness.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AdId(String);

#[cfg(feature = "sqlx")]
impl sqlx::Type<sqlx::Postgres> for AdId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

#[cfg(feature = "sqlx")]
impl sqlx::Encode<'_, sqlx::Postgres> for AdId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(feature = "sqlx")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for AdId {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Decode<sqlx::Postgres>>::decode(value).map(AdId)
    }
}

impl AdId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AdId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AdId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A request correlation id. Opaque to the core; callers generate these
/// (typically a UUID) to key the runner's reply-channel registry.
pub type RequestId = String;
