//! MemberActivity Model (append-only audit trail)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "activity_type", rename_all = "snake_case"))]
pub enum ActivityType {
    Donation,
    TierChange,
    EventRegistration,
    RegistrationStatus,
    Communication,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MemberActivity {
    pub id: i64,
    pub member_id: i64,
    pub activity_type: ActivityType,
    pub description: String,
    /// Signed money value (negative for removed donations)
    pub activity_value: Option<Decimal>,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub member_id: i64,
    pub activity_type: ActivityType,
    pub description: String,
    pub activity_value: Option<Decimal>,
}

impl NewActivity {
    pub fn new(member_id: i64, activity_type: ActivityType, description: impl Into<String>) -> Self {
        Self {
            member_id,
            activity_type,
            description: description.into(),
            activity_value: None,
        }
    }

    pub fn with_value(mut self, value: Decimal) -> Self {
        self.activity_value = Some(value);
        self
    }
}
