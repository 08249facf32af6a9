//! Communication and CommunicationRecipient Models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "communication_channel", rename_all = "snake_case")
)]
pub enum CommunicationChannel {
    #[default]
    Email,
    Sms,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "communication_status", rename_all = "snake_case")
)]
pub enum CommunicationStatus {
    #[default]
    Draft,
    Scheduled,
    Sent,
}

/// A bulk message addressed to one or more segments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Communication {
    pub id: i64,
    pub subject: String,
    pub body: String,
    pub channel: CommunicationChannel,
    pub status: CommunicationStatus,
    pub recipient_segments: Vec<String>,
    pub total_recipients: i32,
    pub scheduled_at: Option<i64>,
    pub sent_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create communication payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunicationCreate {
    pub subject: String,
    pub body: String,
    pub channel: Option<CommunicationChannel>,
    pub recipient_segments: Vec<String>,
    pub scheduled_at: Option<i64>,
}

/// Validated insert row
#[derive(Debug, Clone)]
pub struct NewCommunication {
    pub subject: String,
    pub body: String,
    pub channel: CommunicationChannel,
    pub status: CommunicationStatus,
    pub recipient_segments: Vec<String>,
    pub total_recipients: i32,
    pub scheduled_at: Option<i64>,
}

/// Per-member delivery row for a communication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CommunicationRecipient {
    pub id: i64,
    pub communication_id: i64,
    pub member_id: i64,
    pub delivered: bool,
    pub opened: bool,
    pub clicked: bool,
    pub bounced: bool,
    pub delivered_at: Option<i64>,
    pub opened_at: Option<i64>,
    pub clicked_at: Option<i64>,
}

/// Engagement signal reported by the delivery provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingEvent {
    Delivered,
    Open,
    Click,
    Bounce,
}

/// Tracking payload (`POST /api/communications/{id}/recipients/{member_id}/track`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientTrack {
    pub event: TrackingEvent,
}

/// Result of materialising recipient rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientMaterialization {
    pub communication_id: i64,
    /// Rows inserted by this call (0 when rows already existed)
    pub created: usize,
    pub total_recipients: i32,
}

/// Result of a send run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReport {
    pub communication: Communication,
    pub delivered: usize,
    pub failed: usize,
}
