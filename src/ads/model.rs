//! Ad records and their enumerations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Slot in the client UI where an ad may be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    HomeScreen,
    RideSummary,
    MapView,
}

impl Placement {
    /// Wire name of the placement.
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::HomeScreen => "home_screen",
            Placement::RideSummary => "ride_summary",
            Placement::MapView => "map_view",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the recognized placements.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid placement value")]
pub struct UnknownPlacement;

impl FromStr for Placement {
    type Err = UnknownPlacement;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home_screen" => Ok(Placement::HomeScreen),
            "ride_summary" => Ok(Placement::RideSummary),
            "map_view" => Ok(Placement::MapView),
            _ => Err(UnknownPlacement),
        }
    }
}

/// Lifecycle status of an ad. Only ever moves from `Active` to `Inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdStatus {
    Active,
    Inactive,
}

/// Input for creating an ad. Title and image URL are expected to be
/// non-empty by the time they get here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAd {
    pub title: String,
    pub image_url: String,
    pub placement: Placement,
    /// Minutes the ad stays listable; 0 means no expiry.
    pub ttl_minutes: u32,
}

/// A stored ad post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ad {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub placement: Placement,
    pub status: AdStatus,
    pub created_at: DateTime<Utc>,
    /// Nominal expiry at creation, overwritten with the deactivation time.
    /// Informational only; listing eligibility never reads it.
    pub deactivate_at: Option<DateTime<Utc>>,
    pub ttl_minutes: u32,
}

impl Ad {
    /// Build a fresh active record from creation input.
    pub(crate) fn from_new(id: String, new: NewAd, now: DateTime<Utc>) -> Self {
        let mut ad = Self {
            id,
            title: new.title,
            image_url: new.image_url,
            placement: new.placement,
            status: AdStatus::Active,
            created_at: now,
            deactivate_at: None,
            ttl_minutes: new.ttl_minutes,
        };
        ad.deactivate_at = ad.expires_at();
        ad
    }

    /// `created_at + ttl_minutes`, or `None` for ads that never expire.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.ttl_minutes == 0 {
            return None;
        }
        Some(self.created_at + Duration::minutes(i64::from(self.ttl_minutes)))
    }

    pub fn is_active(&self) -> bool {
        self.status == AdStatus::Active
    }

    /// Whether the ad should be listed for `placement` at `now`.
    ///
    /// Active, same placement, and not past its TTL. The expiry instant itself
    /// is still eligible.
    pub fn is_eligible_at(&self, now: DateTime<Utc>, placement: Placement) -> bool {
        if !self.is_active() || self.placement != placement {
            return false;
        }
        match self.expires_at() {
            Some(expires_at) => now <= expires_at,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ttl_minutes: u32, now: DateTime<Utc>) -> Ad {
        Ad::from_new(
            "id-1".to_string(),
            NewAd {
                title: "Spring sale".to_string(),
                image_url: "http://example.com/spring.png".to_string(),
                placement: Placement::RideSummary,
                ttl_minutes,
            },
            now,
        )
    }

    #[test]
    fn test_placement_parse_and_display() {
        for p in [Placement::HomeScreen, Placement::RideSummary, Placement::MapView] {
            assert_eq!(p.as_str().parse::<Placement>(), Ok(p));
            assert_eq!(p.to_string(), p.as_str());
        }
        assert_eq!("banner".parse::<Placement>(), Err(UnknownPlacement));
        assert_eq!("".parse::<Placement>(), Err(UnknownPlacement));
    }

    #[test]
    fn test_new_ad_with_ttl_has_deactivate_at() {
        let now = Utc::now();
        let ad = sample(60, now);

        assert_eq!(ad.status, AdStatus::Active);
        assert_eq!(ad.created_at, now);
        assert_eq!(ad.deactivate_at, Some(now + Duration::minutes(60)));
    }

    #[test]
    fn test_new_ad_without_ttl_never_expires() {
        let now = Utc::now();
        let ad = sample(0, now);

        assert_eq!(ad.deactivate_at, None);
        assert!(ad.is_eligible_at(now + Duration::days(3650), Placement::RideSummary));
    }

    #[test]
    fn test_eligibility_boundary() {
        let now = Utc::now();
        let ad = sample(30, now);
        let expiry = now + Duration::minutes(30);

        assert!(ad.is_eligible_at(expiry, Placement::RideSummary));
        assert!(!ad.is_eligible_at(expiry + Duration::milliseconds(1), Placement::RideSummary));
    }

    #[test]
    fn test_eligibility_requires_matching_placement_and_active() {
        let now = Utc::now();
        let mut ad = sample(0, now);

        assert!(!ad.is_eligible_at(now, Placement::MapView));

        ad.status = AdStatus::Inactive;
        assert!(!ad.is_eligible_at(now, Placement::RideSummary));
    }

    #[test]
    fn test_ad_json_shape() {
        let ad = sample(0, Utc::now());
        let json = serde_json::to_value(&ad).unwrap();

        assert_eq!(json["placement"], "ride_summary");
        assert_eq!(json["status"], "active");
        assert_eq!(json["image_url"], "http://example.com/spring.png");
        assert!(json["deactivate_at"].is_null());
        assert_eq!(json["ttl_minutes"], 0);
    }
}
