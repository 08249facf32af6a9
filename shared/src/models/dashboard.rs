//! Dashboard aggregates

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Tier;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierCount {
    pub tier: Tier,
    pub members: i64,
}

/// `GET /api/dashboard/summary`; all zeros on an empty database
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardSummary {
    pub total_members: i64,
    pub active_members: i64,
    pub total_donations: i64,
    pub total_raised: Decimal,
    pub raised_this_month: Decimal,
    pub upcoming_events: i64,
    pub communications_sent: i64,
    pub active_automations: i64,
    pub tiers: Vec<TierCount>,
}

impl DashboardSummary {
    /// Fill tier counts so every tier appears, in rank order
    pub fn with_tier_counts(mut self, counts: &[(Tier, i64)]) -> Self {
        self.tiers = Tier::ALL
            .into_iter()
            .map(|tier| TierCount {
                tier,
                members: counts
                    .iter()
                    .find(|(t, _)| *t == tier)
                    .map(|(_, n)| *n)
                    .unwrap_or(0),
            })
            .collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_counts_cover_all_tiers() {
        let summary = DashboardSummary::default().with_tier_counts(&[(Tier::Gold, 2)]);
        assert_eq!(summary.tiers.len(), 4);
        assert_eq!(summary.tiers[0].tier, Tier::Bronze);
        assert_eq!(summary.tiers[0].members, 0);
        assert_eq!(summary.tiers[2].members, 2);
    }
}
