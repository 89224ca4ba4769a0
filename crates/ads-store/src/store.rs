use std::collections::{BTreeSet, HashMap};

use ads_model::{Ad, AdError, AdId, GetAdsQuery, Version};
use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::interval::IntervalIndex;

/// The in-memory, multi-index ad catalog.
///
/// `Store` performs no synchronization of its own: the runner is the sole
/// mutator, so every `&mut self` method here assumes single-writer access.
/// `get_ads` takes `&self` and is safe to call
/// concurrently with itself, but *not* concurrently with a mutator — callers
/// off the runner's own task must wrap reads in a lock paired with the
/// writer; the in-process runner itself never needs to, since it
/// is the only mutator and only ever calls `get_ads` from its own loop.
#[derive(Debug)]
pub struct Store {
    version: Version,
    ads: HashMap<AdId, Ad>,
    ads_by_country: HashMap<String, BTreeSet<AdId>>,
    ads_by_gender: HashMap<String, BTreeSet<AdId>>,
    ads_by_platform: HashMap<String, BTreeSet<AdId>>,
    ad_by_time_interval: IntervalIndex,
    ad_by_age: IntervalIndex,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            version: Version::ZERO,
            ads: HashMap::new(),
            ads_by_country: HashMap::new(),
            ads_by_gender: HashMap::new(),
            ads_by_platform: HashMap::new(),
            ad_by_time_interval: IntervalIndex::new(),
            ad_by_age: IntervalIndex::new(),
        }
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn len(&self) -> usize {
        self.ads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ads.is_empty()
    }

    pub fn get(&self, id: &AdId) -> Option<&Ad> {
        self.ads.get(id)
    }

    /// Installs `ad` into every index. Shared by `create_ad` and
    /// `create_batch_ads` so the two paths can never diverge on which
    /// indexes get populated, including the interval indexes.
    fn install(&mut self, ad: Ad) {
        for country in &ad.country {
            self.ads_by_country
                .entry(country.clone())
                .or_default()
                .insert(ad.id.clone());
        }
        for gender in &ad.gender {
            self.ads_by_gender
                .entry(gender.clone())
                .or_default()
                .insert(ad.id.clone());
        }
        for platform in &ad.platform {
            self.ads_by_platform
                .entry(platform.clone())
                .or_default()
                .insert(ad.id.clone());
        }

        self.ad_by_time_interval.insert(
            ad.start_at.timestamp(),
            ad.end_at.timestamp(),
            ad.id.clone(),
        );
        self.ad_by_age
            .insert(ad.age_start as i64, ad.age_end as i64, ad.id.clone());

        self.ads.insert(ad.id.clone(), ad);
    }

    /// `CreateAd`. Precondition: `ad.version == store.version + 1`.
    pub fn create_ad(&mut self, ad: Ad) -> Result<AdId, AdError> {
        let expected = self.version.next();
        if ad.version != expected {
            return Err(AdError::InvalidVersion {
                expected: expected.get(),
                got: ad.version.get(),
            });
        }
        let id = ad.id.clone();
        self.version = ad.version;
        trace!(ad_id = %id, version = %self.version, "installing ad");
        self.install(ad);
        Ok(id)
    }

    /// `CreateBatchAds`. Used only for snapshot restore: does
    /// NOT enforce version continuity. Ads are installed in ascending
    /// version order and `store.version` advances to the maximum
    /// encountered version.
    pub fn create_batch_ads(&mut self, mut ads: Vec<Ad>) -> Result<Version, AdError> {
        ads.sort_by_key(|ad| ad.version);
        for ad in ads {
            self.version = self.version.max(ad.version);
            self.install(ad);
        }
        debug!(version = %self.version, count = self.ads.len(), "batch restore complete");
        Ok(self.version)
    }

    /// `GetAds`, evaluated against `now`. Exposed separately
    /// from [`Store::get_ads`] so tests can pin the clock.
    pub fn get_ads_at(
        &self,
        query: &GetAdsQuery,
        now: DateTime<Utc>,
    ) -> Result<(Vec<Ad>, i64), AdError> {
        let mut candidates: Option<BTreeSet<AdId>> = None;

        if let Some(country) = query.country_filter() {
            candidates = Some(intersect_with_bucket(
                candidates,
                self.ads_by_country.get(country),
            ));
        }
        if let Some(gender) = query.gender_filter() {
            candidates = Some(intersect_with_bucket(
                candidates,
                self.ads_by_gender.get(gender),
            ));
        }
        if let Some(platform) = query.platform_filter() {
            candidates = Some(intersect_with_bucket(
                candidates,
                self.ads_by_platform.get(platform),
            ));
        }

        let candidates: BTreeSet<AdId> = candidates.unwrap_or_else(|| self.ads.keys().cloned().collect());

        let mut retained: Vec<Ad> = candidates
            .into_iter()
            .filter_map(|id| self.ads.get(&id))
            .filter(|ad| ad.is_active_at(now) && ad.matches_age(query.age))
            .cloned()
            .collect();
        retained.sort_by(|a, b| a.id.cmp(&b.id));

        let total = retained.len() as i64;
        if total == 0 {
            return Err(AdError::NoAdsFound);
        }
        if query.offset < 0 || query.offset >= total {
            return Err(AdError::OffsetOutOfRange {
                offset: query.offset,
                total,
            });
        }

        let start = query.offset as usize;
        let end = ((query.offset + query.limit.max(0)) as usize).min(retained.len());
        Ok((retained[start..end].to_vec(), total))
    }

    /// `GetAds` evaluated against the current wall-clock time.
    pub fn get_ads(&self, query: &GetAdsQuery) -> Result<(Vec<Ad>, i64), AdError> {
        self.get_ads_at(query, Utc::now())
    }
}

/// Intersects `current` (if any) with `bucket` (if any), treating a missing
/// bucket as empty. `None` for `current` means "unconstrained so far".
fn intersect_with_bucket(
    current: Option<BTreeSet<AdId>>,
    bucket: Option<&BTreeSet<AdId>>,
) -> BTreeSet<AdId> {
    let bucket = bucket.cloned().unwrap_or_default();
    match current {
        Some(current) => current.intersection(&bucket).cloned().collect(),
        None => bucket,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ad(id: &str, version: i64) -> Ad {
        let now = Utc::now();
        Ad {
            id: AdId::new(id),
            title: "t".into(),
            content: "c".into(),
            start_at: now - Duration::hours(24),
            end_at: now + Duration::hours(24),
            age_start: 18,
            age_end: 65,
            gender: vec!["F".into(), "M".into()],
            country: vec!["TW".into()],
            platform: vec!["ios".into()],
            version: Version::new(version),
        }
    }

    fn query(age: i32, country: &str, offset: i64, limit: i64) -> GetAdsQuery {
        GetAdsQuery {
            age,
            country: country.to_string(),
            gender: String::new(),
            platform: String::new(),
            offset,
            limit,
        }
    }

    #[test]
    fn fresh_create_advances_version_and_returns_id() {
        let mut store = Store::new();
        let id = store.create_ad(ad("a1", 1)).unwrap();
        assert_eq!(id, AdId::new("a1"));
        assert_eq!(store.version(), Version::new(1));
    }

    #[test]
    fn version_skew_is_rejected_and_version_unchanged() {
        let mut store = Store::new();
        store.create_ad(ad("a1", 1)).unwrap();
        let err = store.create_ad(ad("a2", 3)).unwrap_err();
        assert_eq!(
            err,
            AdError::InvalidVersion {
                expected: 2,
                got: 3
            }
        );
        assert_eq!(store.version(), Version::new(1));
    }

    #[test]
    fn targeted_query_hit() {
        let mut store = Store::new();
        store.create_ad(ad("a1", 1)).unwrap();
        let (ads, total) = store.get_ads(&query(18, "TW", 0, 10)).unwrap();
        assert_eq!(total, 1);
        assert_eq!(ads.len(), 1);
        assert_eq!(ads[0].id, AdId::new("a1"));
    }

    #[test]
    fn targeted_query_miss() {
        let mut store = Store::new();
        store.create_ad(ad("a1", 1)).unwrap();
        let err = store.get_ads(&query(18, "US", 0, 10)).unwrap_err();
        assert_eq!(err, AdError::NoAdsFound);
    }

    #[test]
    fn pagination_boundary() {
        let mut store = Store::new();
        for i in 1..=5 {
            store.create_ad(ad(&format!("a{i}"), i)).unwrap();
        }
        let err = store.get_ads(&query(18, "TW", 5, 10)).unwrap_err();
        assert_eq!(
            err,
            AdError::OffsetOutOfRange {
                offset: 5,
                total: 5
            }
        );

        let (ads, total) = store.get_ads(&query(18, "TW", 4, 10)).unwrap();
        assert_eq!(total, 5);
        assert_eq!(ads.len(), 1);
    }

    #[test]
    fn batch_restore_accepts_unsorted_versions() {
        let mut store = Store::new();
        let version = store
            .create_batch_ads(vec![ad("a5", 5), ad("a2", 2), ad("a9", 9)])
            .unwrap();
        assert_eq!(version, Version::new(9));
        assert_eq!(store.version(), Version::new(9));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn batch_restore_populates_interval_indexes() {
        let mut store = Store::new();
        store.create_batch_ads(vec![ad("a1", 1)]).unwrap();
        assert_eq!(store.ad_by_time_interval.len(), 1);
        assert_eq!(store.ad_by_age.len(), 1);
    }

    #[test]
    fn categorical_index_invariant_holds_after_create() {
        let mut store = Store::new();
        let mut a = ad("a1", 1);
        a.country = vec!["TW".into(), "US".into()];
        store.create_ad(a).unwrap();
        assert!(store.ads_by_country["TW"].contains(&AdId::new("a1")));
        assert!(store.ads_by_country["US"].contains(&AdId::new("a1")));
    }

    #[test]
    fn unconstrained_filters_scan_all_ads() {
        let mut store = Store::new();
        store.create_ad(ad("a1", 1)).unwrap();
        let q = query(18, "", 0, 10);
        let (ads, total) = store.get_ads(&q).unwrap();
        assert_eq!(total, 1);
        assert_eq!(ads.len(), 1);
    }
}
