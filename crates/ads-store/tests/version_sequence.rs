use ads_model::{Ad, AdId, Version};
use ads_store::Store;
use chrono::{Duration, Utc};
use proptest::prelude::*;

fn ad_with_version(version: i64) -> Ad {
    let now = Utc::now();
    Ad {
        id: AdId::new(format!("ad-{version}")),
        title: "t".into(),
        content: "c".into(),
        start_at: now - Duration::hours(1),
        end_at: now + Duration::hours(1),
        age_start: 0,
        age_end: 100,
        gender: vec![],
        country: vec![],
        platform: vec![],
        version: Version::new(version),
    }
}

proptest! {
    /// For all successful `CreateAd` sequences with initial `store.version = 0`,
    /// after `n` successes the store's version is `n` and every installed
    /// ad's version lies in `(0, n]`, each value taken exactly once.
    #[test]
    fn create_ad_sequence_advances_version_exactly_once_per_call(n in 1usize..50) {
        let mut store = Store::new();
        for v in 1..=n as i64 {
            store.create_ad(ad_with_version(v)).unwrap();
        }
        prop_assert_eq!(store.version(), Version::new(n as i64));
        prop_assert_eq!(store.len(), n);
    }
}
