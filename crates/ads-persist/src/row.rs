use ads_model::{Ad, AdId, Version};
use chrono::{DateTime, Utc};

/// Maps 1:1 onto the `ads` table:
///
/// ```sql
/// CREATE TABLE ads (
///     id         TEXT PRIMARY KEY,
///     title      TEXT NOT NULL,
///     content    TEXT NOT NULL,
///     start_at   TIMESTAMPTZ NOT NULL,
///     end_at     TIMESTAMPTZ NOT NULL,
///     age_start  INTEGER NOT NULL,
///     age_end    INTEGER NOT NULL,
///     gender     TEXT[] NOT NULL,
///     country    TEXT[] NOT NULL,
///     platform   TEXT[] NOT NULL,
///     version    BIGINT NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT now()
/// );
/// ```
///
/// `version` is unique rather than part of a composite key: the table is a
/// single append-only timeline shared by every ad, not per-ad
/// history.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub age_start: i32,
    pub age_end: i32,
    pub gender: Vec<String>,
    pub country: Vec<String>,
    pub platform: Vec<String>,
    pub version: i64,
}

impl From<&Ad> for AdRow {
    fn from(ad: &Ad) -> Self {
        Self {
            id: ad.id.as_str().to_string(),
            title: ad.title.clone(),
            content: ad.content.clone(),
            start_at: ad.start_at,
            end_at: ad.end_at,
            age_start: ad.age_start,
            age_end: ad.age_end,
            gender: ad.gender.clone(),
            country: ad.country.clone(),
            platform: ad.platform.clone(),
            version: ad.version.get(),
        }
    }
}

impl From<AdRow> for Ad {
    fn from(row: AdRow) -> Self {
        Ad {
            id: AdId::new(row.id),
            title: row.title,
            content: row.content,
            start_at: row.start_at,
            end_at: row.end_at,
            age_start: row.age_start,
            age_end: row.age_end,
            gender: row.gender,
            country: row.country,
            platform: row.platform,
            version: Version::new(row.version),
        }
    }
}
