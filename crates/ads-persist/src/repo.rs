use ads_model::Ad;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use crate::error::Error;
use crate::row::AdRow;

/// The highest `version` committed so far, or `0` if the table is empty.
#[instrument(skip_all)]
pub async fn max_version(db: &PgPool) -> Result<i64, Error> {
    let max: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM ads")
        .fetch_one(db)
        .await?;
    let max = max.unwrap_or(0);
    debug!(%max, "read max version");
    Ok(max)
}

/// The highest `version` visible within an already-open transaction. Used by
/// [`crate::lock::with_max_version`]-style callers that must read the
/// watermark and insert atomically without a second round trip racing
/// another writer.
#[instrument(skip_all)]
pub async fn max_version_txn(txn: &mut Transaction<'_, Postgres>) -> Result<i64, Error> {
    let max: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM ads")
        .fetch_one(&mut **txn)
        .await?;
    let max = max.unwrap_or(0);
    debug!(%max, "read max version within transaction");
    Ok(max)
}

/// Inserts one ad row within `txn`. Callers are responsible for assigning
/// `ad.version` before calling this (typically `max_version_txn(txn) + 1`)
/// and for committing `txn` only after the paired event-stream append also
/// succeeds.
#[instrument(skip_all, fields(ad_id = %ad.id, version = %ad.version))]
pub async fn insert_ad(txn: &mut Transaction<'_, Postgres>, ad: &Ad) -> Result<(), Error> {
    let row = AdRow::from(ad);
    sqlx::query(
        r#"
        INSERT INTO ads
            (id, title, content, start_at, end_at, age_start, age_end, gender, country, platform, version)
        VALUES
            ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(&row.id)
    .bind(&row.title)
    .bind(&row.content)
    .bind(row.start_at)
    .bind(row.end_at)
    .bind(row.age_start)
    .bind(row.age_end)
    .bind(&row.gender)
    .bind(&row.country)
    .bind(&row.platform)
    .bind(row.version)
    .execute(&mut **txn)
    .await?;
    debug!(ad_id = %ad.id, "inserted ad row");
    Ok(())
}

/// All ads committed at a version `<= max_version`, ordered by version
/// ascending. Used to warm-start a `Store` on boot before subscribing to the
/// event stream from `max_version` exclusive.
///
/// Every row is re-validated through [`Ad::validate`] on the way out: a row
/// that made it into the table with an inverted time/age window (e.g. from a
/// direct DB edit bypassing `insert_ad`) surfaces as [`Error::InvalidRow`]
/// instead of silently warming the store with a broken ad.
#[instrument(skip_all, fields(%max_version))]
pub async fn fetch_all_up_to(db: &PgPool, max_version: i64) -> Result<Vec<Ad>, Error> {
    let rows: Vec<AdRow> = sqlx::query_as(
        r#"
        SELECT id, title, content, start_at, end_at, age_start, age_end, gender, country, platform, version
        FROM ads
        WHERE version <= $1
        ORDER BY version ASC
        "#,
    )
    .bind(max_version)
    .fetch_all(db)
    .await?;

    debug!(count = rows.len(), "fetched ads up to max version");

    rows.into_iter()
        .map(|row| {
            let id = row.id.clone();
            let ad = Ad::from(row);
            ad.validate()
                .map(|()| ad)
                .map_err(|source| Error::InvalidRow { id, source })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // `AdRow` round-trips through `Ad` without loss; exercised directly here
    // (no live database) since the mapping itself is pure.
    #[test]
    fn ad_row_round_trips_through_ad() {
        use ads_model::{AdId, Version};
        use chrono::{Duration, Utc};

        let now = Utc::now();
        let ad = Ad {
            id: AdId::new("ad-1"),
            title: "t".into(),
            content: "c".into(),
            start_at: now - Duration::hours(1),
            end_at: now + Duration::hours(1),
            age_start: 18,
            age_end: 65,
            gender: vec!["F".into()],
            country: vec!["TW".into(), "JP".into()],
            platform: vec!["ios".into()],
            version: Version::new(7),
        };

        let row = AdRow::from(&ad);
        let round_tripped: Ad = row.into();
        assert_eq!(round_tripped, ad);
    }
}
