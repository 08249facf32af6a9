//! Member Model

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Tier;

/// Guild member
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Member {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Derived from `total_donated`, never set directly
    pub tier: Tier,
    /// Lifetime giving, adjusted by donation mutations
    pub total_donated: Decimal,
    pub last_donation_date: Option<NaiveDate>,
    pub email_subscribed: bool,
    pub newsletter_subscribed: bool,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn summary(&self) -> MemberSummary {
        MemberSummary {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            tier: self.tier,
            total_donated: self.total_donated,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Create member payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberCreate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(default = "default_true")]
    pub email_subscribed: bool,
    #[serde(default)]
    pub newsletter_subscribed: bool,
    pub notes: Option<String>,
}

/// Update member payload (tier and total are not editable)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub email_subscribed: Option<bool>,
    pub newsletter_subscribed: Option<bool>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

/// Compact member view embedded in donation responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub tier: Tier,
    pub total_donated: Decimal,
}

/// List filter (`GET /api/members?q=&tier=`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberQuery {
    pub q: Option<String>,
    pub tier: Option<Tier>,
}

impl MemberQuery {
    /// In-process evaluation of the filter (case-insensitive name/email match)
    pub fn matches(&self, member: &Member) -> bool {
        if let Some(tier) = self.tier
            && member.tier != tier
        {
            return false;
        }
        match self.q.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(q) => {
                let q = q.to_lowercase();
                member.first_name.to_lowercase().contains(&q)
                    || member.last_name.to_lowercase().contains(&q)
                    || member.email.to_lowercase().contains(&q)
            }
        }
    }
}
