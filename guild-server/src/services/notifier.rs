//! Outbound notifications
//!
//! Automations and communication sends hand a [`Notification`] to the
//! configured [`Notifier`]. Without `NOTIFY_WEBHOOK_URL` notifications are
//! only logged.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use shared::models::CommunicationChannel;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Notification {
    /// Trigger name or `communication`
    pub kind: String,
    pub channel: CommunicationChannel,
    pub member_id: i64,
    pub to: String,
    pub recipient_name: String,
    pub subject: String,
    pub body: String,
    /// Ids and entity snapshots the template may use
    pub context: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification transport failed: {0}")]
    Transport(String),
    #[error("Notification rejected with HTTP {0}")]
    Rejected(u16),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            kind = %notification.kind,
            member_id = notification.member_id,
            to = %notification.to,
            subject = %notification.subject,
            "Notification dispatched"
        );
        Ok(())
    }
}

/// POSTs each notification as JSON to a webhook
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                kind = %notification.kind,
                "Notification webhook returned an error status"
            );
            return Err(NotifyError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let notification = Notification {
            kind: "member_onboarding".into(),
            channel: CommunicationChannel::Email,
            member_id: 1,
            to: "ada@example.org".into(),
            recipient_name: "Ada Byron".into(),
            subject: "Welcome".into(),
            body: "Hello".into(),
            context: serde_json::json!({ "member_id": 1 }),
        };
        assert!(LogNotifier.send(&notification).await.is_ok());
    }

    #[test]
    fn test_notification_serializes_channel() {
        let notification = Notification {
            kind: "communication".into(),
            channel: CommunicationChannel::Sms,
            member_id: 2,
            to: "+15550100".into(),
            recipient_name: "Bo".into(),
            subject: "Reminder".into(),
            body: "See you".into(),
            context: serde_json::Value::Null,
        };
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["channel"], "sms");
        assert_eq!(json["member_id"], 2);
    }
}
