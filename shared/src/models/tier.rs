//! Membership tier derived from lifetime giving

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered membership rank: bronze < silver < gold < platinum.
///
/// A tier is never set directly; it is always `Tier::from_total(total_donated)`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "member_tier", rename_all = "lowercase"))]
pub enum Tier {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    /// All tiers in ascending rank order
    pub const ALL: [Tier; 4] = [Tier::Bronze, Tier::Silver, Tier::Gold, Tier::Platinum];

    /// Inclusive lower bound of lifetime giving for silver
    pub const SILVER_THRESHOLD: i64 = 1_000;
    /// Inclusive lower bound of lifetime giving for gold
    pub const GOLD_THRESHOLD: i64 = 5_000;
    /// Inclusive lower bound of lifetime giving for platinum
    pub const PLATINUM_THRESHOLD: i64 = 10_000;

    /// Map a lifetime donated amount to its tier.
    ///
    /// Total and monotonic: a larger total never yields a lower rank.
    /// Negative totals are treated as bronze.
    pub fn from_total(total_donated: Decimal) -> Self {
        if total_donated >= Decimal::from(Self::PLATINUM_THRESHOLD) {
            Tier::Platinum
        } else if total_donated >= Decimal::from(Self::GOLD_THRESHOLD) {
            Tier::Gold
        } else if total_donated >= Decimal::from(Self::SILVER_THRESHOLD) {
            Tier::Silver
        } else {
            Tier::Bronze
        }
    }

    /// Numeric rank (bronze = 0)
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bronze" => Ok(Tier::Bronze),
            "silver" => Ok(Tier::Silver),
            "gold" => Ok(Tier::Gold),
            "platinum" => Ok(Tier::Platinum),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}
