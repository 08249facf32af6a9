//! Communication recipient segments
//!
//! A segment list such as `["gold", "newsletter_subscribers"]` is parsed into
//! a [`SegmentFilter`]. Rules:
//!
//! - `"all"` selects every email-subscribed member and short-circuits the rest
//! - tier names are unioned (`tier IN (...)`)
//! - `"newsletter_subscribers"` adds members with `newsletter_subscribed`
//! - `"recent_donors"` adds members whose last gift is within 90 days
//! - the union is always constrained to `email_subscribed` active members

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Member, Tier};

pub const SEGMENT_ALL: &str = "all";
pub const SEGMENT_NEWSLETTER: &str = "newsletter_subscribers";
pub const SEGMENT_RECENT_DONORS: &str = "recent_donors";

/// Look-back window for `recent_donors`
pub const RECENT_DONOR_WINDOW_DAYS: i64 = 90;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    #[error("At least one recipient segment is required")]
    Empty,
    #[error("Unknown recipient segment: {0}")]
    Unknown(String),
}

/// Parsed segment selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentFilter {
    pub all: bool,
    pub tiers: Vec<Tier>,
    pub newsletter_subscribers: bool,
    /// Set when `recent_donors` was requested
    pub donated_since: Option<NaiveDate>,
}

impl SegmentFilter {
    /// Parse a segment list relative to `today`
    pub fn parse(segments: &[String], today: NaiveDate) -> Result<Self, SegmentError> {
        if segments.is_empty() {
            return Err(SegmentError::Empty);
        }

        if segments.iter().any(|s| s.trim() == SEGMENT_ALL) {
            return Ok(SegmentFilter {
                all: true,
                ..Default::default()
            });
        }

        let mut filter = SegmentFilter::default();
        for segment in segments {
            match segment.trim() {
                SEGMENT_NEWSLETTER => filter.newsletter_subscribers = true,
                SEGMENT_RECENT_DONORS => {
                    filter.donated_since = Some(today - Duration::days(RECENT_DONOR_WINDOW_DAYS));
                }
                other => {
                    let tier = other
                        .parse::<Tier>()
                        .map_err(|_| SegmentError::Unknown(other.to_string()))?;
                    if !filter.tiers.contains(&tier) {
                        filter.tiers.push(tier);
                    }
                }
            }
        }
        filter.tiers.sort();
        Ok(filter)
    }

    /// Whether a member falls inside the selection
    pub fn matches(&self, member: &Member) -> bool {
        if !member.email_subscribed || !member.is_active {
            return false;
        }
        if self.all {
            return true;
        }

        let by_tier = self.tiers.contains(&member.tier);
        let by_newsletter = self.newsletter_subscribers && member.newsletter_subscribed;
        let by_recency = match (self.donated_since, member.last_donation_date) {
            (Some(since), Some(last)) => last >= since,
            _ => false,
        };
        by_tier || by_newsletter || by_recency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn segs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn member(tier: Tier, email: bool, newsletter: bool, last: Option<NaiveDate>) -> Member {
        Member {
            id: 1,
            first_name: "Ada".into(),
            last_name: "Byron".into(),
            email: "ada@example.org".into(),
            phone: None,
            tier,
            total_donated: Decimal::ZERO,
            last_donation_date: last,
            email_subscribed: email,
            newsletter_subscribed: newsletter,
            notes: None,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_all_short_circuits() {
        let with_all = SegmentFilter::parse(&segs(&["all", "gold"]), today()).unwrap();
        let only_all = SegmentFilter::parse(&segs(&["all"]), today()).unwrap();
        assert_eq!(with_all, only_all);
        assert!(with_all.all);
        assert!(with_all.tiers.is_empty());
    }

    #[test]
    fn test_all_ignores_other_entries() {
        let filter = SegmentFilter::parse(&segs(&["vip", "all"]), today()).unwrap();
        assert!(filter.all);
    }

    #[test]
    fn test_parse_union() {
        let filter = SegmentFilter::parse(
            &segs(&["platinum", "gold", "newsletter_subscribers", "gold"]),
            today(),
        )
        .unwrap();
        assert_eq!(filter.tiers, vec![Tier::Gold, Tier::Platinum]);
        assert!(filter.newsletter_subscribers);
        assert_eq!(filter.donated_since, None);
    }

    #[test]
    fn test_recent_donors_window() {
        let filter = SegmentFilter::parse(&segs(&["recent_donors"]), today()).unwrap();
        assert_eq!(
            filter.donated_since,
            NaiveDate::from_ymd_opt(2025, 4, 1)
        );

        let inside = member(Tier::Bronze, true, false, NaiveDate::from_ymd_opt(2025, 4, 1));
        let outside = member(Tier::Bronze, true, false, NaiveDate::from_ymd_opt(2025, 3, 31));
        let never = member(Tier::Bronze, true, false, None);
        assert!(filter.matches(&inside));
        assert!(!filter.matches(&outside));
        assert!(!filter.matches(&never));
    }

    #[test]
    fn test_empty_and_unknown() {
        assert_eq!(SegmentFilter::parse(&[], today()), Err(SegmentError::Empty));
        assert_eq!(
            SegmentFilter::parse(&segs(&["diamond"]), today()),
            Err(SegmentError::Unknown("diamond".into()))
        );
    }

    #[test]
    fn test_matches_requires_email_subscription() {
        let filter = SegmentFilter::parse(&segs(&["all"]), today()).unwrap();
        assert!(filter.matches(&member(Tier::Gold, true, false, None)));
        assert!(!filter.matches(&member(Tier::Gold, false, true, None)));

        let filter = SegmentFilter::parse(&segs(&["gold", "newsletter_subscribers"]), today())
            .unwrap();
        assert!(filter.matches(&member(Tier::Gold, true, false, None)));
        assert!(filter.matches(&member(Tier::Bronze, true, true, None)));
        assert!(!filter.matches(&member(Tier::Silver, true, false, None)));
        assert!(!filter.matches(&member(Tier::Gold, false, true, None)));
    }

    #[test]
    fn test_inactive_members_excluded() {
        let filter = SegmentFilter::parse(&segs(&["all"]), today()).unwrap();
        let mut m = member(Tier::Gold, true, true, None);
        m.is_active = false;
        assert!(!filter.matches(&m));
    }
}
