use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AdId, Version};

/// A targeted advertisement: a time window, an age window, and the
/// categorical targeting sets it is eligible under.
///
/// Field order mirrors the persisted `ads` table so that
/// `ads-persist`'s row mapping reads naturally alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ad {
    pub id: AdId,
    pub title: String,
    pub content: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub age_start: i32,
    pub age_end: i32,
    pub gender: Vec<String>,
    pub country: Vec<String>,
    pub platform: Vec<String>,
    pub version: Version,
}

/// Errors produced by [`Ad::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdValidationError {
    #[error("start_at ({start_at}) must be strictly before end_at ({end_at})")]
    WindowInverted {
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    },
    #[error("age_start ({age_start}) must be less than or equal to age_end ({age_end})")]
    AgeRangeInverted { age_start: i32, age_end: i32 },
}

impl Ad {
    /// Validates the invariants every `Ad` must satisfy regardless of where
    /// it came from (a fresh `CreateAd` call or a replayed/restored row):
    /// `StartAt < EndAt` and `AgeStart <= AgeEnd`.
    pub fn validate(&self) -> Result<(), AdValidationError> {
        if !(self.start_at < self.end_at) {
            return Err(AdValidationError::WindowInverted {
                start_at: self.start_at,
                end_at: self.end_at,
            });
        }
        if self.age_start > self.age_end {
            return Err(AdValidationError::AgeRangeInverted {
                age_start: self.age_start,
                age_end: self.age_end,
            });
        }
        Ok(())
    }

    /// Whether the ad's active window contains `now`, using the exact
    /// half-open-on-the-left, closed-on-the-right inequality:
    /// `StartAt < now <= EndAt`. `StartAt == now` is *not* yet active.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.start_at < now && now <= self.end_at
    }

    /// Whether `age` falls within the ad's closed `[AgeStart, AgeEnd]`
    /// targeting window. Unlike the time window, both age bounds are closed.
    pub fn matches_age(&self, age: i32) -> bool {
        self.age_start <= age && age <= self.age_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_ad() -> Ad {
        let now = Utc::now();
        Ad {
            id: AdId::new("ad-1"),
            title: "t".into(),
            content: "c".into(),
            start_at: now - Duration::hours(24),
            end_at: now + Duration::hours(24),
            age_start: 18,
            age_end: 65,
            gender: vec!["F".into(), "M".into()],
            country: vec!["TW".into()],
            platform: vec!["ios".into()],
            version: Version::new(1),
        }
    }

    #[test]
    fn validate_accepts_well_formed_ad() {
        assert!(base_ad().validate().is_ok());
    }

    #[test]
    fn validate_rejects_inverted_window() {
        let mut ad = base_ad();
        ad.end_at = ad.start_at;
        assert!(matches!(
            ad.validate(),
            Err(AdValidationError::WindowInverted { .. })
        ));
    }

    #[test]
    fn validate_rejects_inverted_age_range() {
        let mut ad = base_ad();
        ad.age_start = 50;
        ad.age_end = 20;
        assert!(matches!(
            ad.validate(),
            Err(AdValidationError::AgeRangeInverted { .. })
        ));
    }

    #[test]
    fn start_at_equal_now_is_not_active() {
        let ad = base_ad();
        assert!(!ad.is_active_at(ad.start_at));
        assert!(ad.is_active_at(ad.start_at + Duration::seconds(1)));
    }

    #[test]
    fn end_at_equal_now_is_active() {
        let ad = base_ad();
        assert!(ad.is_active_at(ad.end_at));
    }

    #[test]
    fn age_bounds_are_closed() {
        let ad = base_ad();
        assert!(ad.matches_age(ad.age_start));
        assert!(ad.matches_age(ad.age_end));
        assert!(!ad.matches_age(ad.age_end + 1));
    }
}
