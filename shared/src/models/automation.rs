//! Automation and AutomationLog Models
//!
//! Each trigger type declares the entity ids it needs in `trigger_data`;
//! a missing id is rejected before any side effect runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "trigger_type", rename_all = "snake_case"))]
pub enum TriggerType {
    MemberOnboarding,
    DonationAcknowledgment,
    EventReminder,
    EventFollowUp,
    TierUpgrade,
}

/// An id a trigger needs in its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerField {
    MemberId,
    DonationId,
    EventId,
}

impl TriggerField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerField::MemberId => "member_id",
            TriggerField::DonationId => "donation_id",
            TriggerField::EventId => "event_id",
        }
    }
}

impl TriggerType {
    pub const ALL: [TriggerType; 5] = [
        TriggerType::MemberOnboarding,
        TriggerType::DonationAcknowledgment,
        TriggerType::EventReminder,
        TriggerType::EventFollowUp,
        TriggerType::TierUpgrade,
    ];

    pub fn required_fields(self) -> &'static [TriggerField] {
        use TriggerField::*;
        match self {
            TriggerType::MemberOnboarding | TriggerType::TierUpgrade => &[MemberId],
            TriggerType::DonationAcknowledgment => &[DonationId, MemberId],
            TriggerType::EventReminder | TriggerType::EventFollowUp => &[EventId, MemberId],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::MemberOnboarding => "member_onboarding",
            TriggerType::DonationAcknowledgment => "donation_acknowledgment",
            TriggerType::EventReminder => "event_reminder",
            TriggerType::EventFollowUp => "event_follow_up",
            TriggerType::TierUpgrade => "tier_upgrade",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TriggerType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown trigger type: {s}"))
    }
}

/// Ids supplied when firing an automation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donation_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<i64>,
}

impl TriggerData {
    pub fn member(member_id: i64) -> Self {
        Self {
            member_id: Some(member_id),
            ..Default::default()
        }
    }

    pub fn get(&self, field: TriggerField) -> Option<i64> {
        match field {
            TriggerField::MemberId => self.member_id,
            TriggerField::DonationId => self.donation_id,
            TriggerField::EventId => self.event_id,
        }
    }

    /// Required fields that are absent for `trigger`, in declaration order
    pub fn missing_for(&self, trigger: TriggerType) -> Vec<&'static str> {
        trigger
            .required_fields()
            .iter()
            .filter(|f| self.get(**f).is_none())
            .map(|f| f.as_str())
            .collect()
    }
}

/// Stored automation definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Automation {
    pub id: i64,
    pub name: String,
    pub trigger_type: TriggerType,
    /// Opaque action list forwarded to the notifier
    #[cfg_attr(feature = "db", sqlx(json))]
    pub actions: serde_json::Value,
    pub is_active: bool,
    pub run_count: i64,
    pub last_run: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create automation payload (`trigger_type` validated server-side)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationCreate {
    pub name: String,
    pub trigger_type: String,
    #[serde(default)]
    pub actions: serde_json::Value,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutomationUpdate {
    pub name: Option<String>,
    pub actions: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewAutomation {
    pub name: String,
    pub trigger_type: TriggerType,
    pub actions: serde_json::Value,
    pub is_active: bool,
}

/// One dispatch attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AutomationLog {
    pub id: i64,
    pub automation_id: i64,
    pub trigger_type: TriggerType,
    pub success: bool,
    pub error_message: Option<String>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub trigger_data: TriggerData,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewAutomationLog {
    pub automation_id: i64,
    pub trigger_type: TriggerType,
    pub success: bool,
    pub error_message: Option<String>,
    pub trigger_data: TriggerData,
}

/// Trigger payload (`POST /api/automations/{id}/trigger`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerRequest {
    #[serde(default)]
    pub trigger_data: TriggerData,
}

/// Successful dispatch result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerResult {
    pub automation: Automation,
    pub log: AutomationLog,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trigger_type() {
        for t in TriggerType::ALL {
            assert_eq!(t.as_str().parse::<TriggerType>(), Ok(t));
        }
        assert!("birthday".parse::<TriggerType>().is_err());
    }

    #[test]
    fn test_missing_fields() {
        let data = TriggerData::member(5);
        assert!(data.missing_for(TriggerType::MemberOnboarding).is_empty());
        assert!(data.missing_for(TriggerType::TierUpgrade).is_empty());
        assert_eq!(
            data.missing_for(TriggerType::DonationAcknowledgment),
            vec!["donation_id"]
        );
        assert_eq!(
            TriggerData::default().missing_for(TriggerType::EventReminder),
            vec!["event_id", "member_id"]
        );
    }

    #[test]
    fn test_trigger_data_serde_skips_absent() {
        let json = serde_json::to_string(&TriggerData::member(3)).unwrap();
        assert_eq!(json, r#"{"member_id":3}"#);
        let parsed: TriggerRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.trigger_data, TriggerData::default());
    }
}
