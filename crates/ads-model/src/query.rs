use serde::{Deserialize, Serialize};

/// Targeting and pagination parameters for `GetAds`.
///
/// Empty attribute strings mean "unconstrained": the filter for that
/// attribute is skipped entirely rather than matched against an empty set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetAdsQuery {
    pub age: i32,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub platform: String,
    pub offset: i64,
    pub limit: i64,
}

impl GetAdsQuery {
    pub fn country_filter(&self) -> Option<&str> {
        non_empty(&self.country)
    }

    pub fn gender_filter(&self) -> Option<&str> {
        non_empty(&self.gender)
    }

    pub fn platform_filter(&self) -> Option<&str> {
        non_empty(&self.platform)
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
