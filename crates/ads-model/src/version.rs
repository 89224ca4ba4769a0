use std::fmt;

/// A strictly positive, globally monotonic sequence number.
///
/// `Version` intentionally doesn't implement `Default`: there is no such
/// thing as version zero for an ad, only for a store that has not yet
/// accepted a write (see [`Version::ZERO`]).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

#[cfg(feature = "sqlx")]
impl sqlx::Type<sqlx::Postgres> for Version {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

#[cfg(feature = "sqlx")]
impl sqlx::Encode<'_, sqlx::Postgres> for Version {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(feature = "sqlx")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Version {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        <i64 as sqlx::Decode<sqlx::Postgres>>::decode(value).map(Version)
    }
}

impl Version {
    /// The zero value, representing "no versions assigned yet" for a store.
    pub const ZERO: Version = Version(0);

    pub fn new(v: i64) -> Self {
        Self(v)
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// The version that immediately follows this one.
    pub fn next(self) -> Version {
        Version(self.0 + 1)
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add<i64> for Version {
    type Output = Version;
    fn add(self, rhs: i64) -> Version {
        Version(self.0 + rhs)
    }
}
