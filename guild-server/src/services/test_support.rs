//! Helpers shared by service tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{Event, EventCreate, EventStatus, Member, MemberActivity, MemberCreate, Tier};
use shared::util::now_millis;

use crate::db::memory::MemoryStore;
use crate::services::{event, member};
use crate::services::notifier::{Notification, Notifier, NotifyError};
use crate::state::AppState;

/// Notifier that keeps every notification and can be told to fail
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failure: Mutex<Option<String>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_with(&self, reason: &str) {
        *self.failure.lock().unwrap() = Some(reason.to_string());
    }

    pub fn fail_for(&self, address: &str) {
        *self.failure.lock().unwrap() = Some(format!("to:{address}"));
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let failure = self.failure.lock().unwrap().clone();
        match failure {
            Some(rule) if rule.strip_prefix("to:").is_some_and(|a| a == notification.to) => {
                Err(NotifyError::Transport(format!("mailbox {} unavailable", notification.to)))
            }
            Some(rule) if !rule.starts_with("to:") => Err(NotifyError::Transport(rule)),
            _ => {
                self.sent.lock().unwrap().push(notification.clone());
                Ok(())
            }
        }
    }
}

pub fn test_state() -> (AppState, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState::new(Arc::new(MemoryStore::new()), notifier.clone());
    (state, notifier)
}

pub fn member_create(email: &str) -> MemberCreate {
    let local = email.split('@').next().unwrap_or(email);
    MemberCreate {
        first_name: local.to_string(),
        last_name: "Tester".into(),
        email: email.to_string(),
        phone: None,
        email_subscribed: true,
        newsletter_subscribed: false,
        notes: None,
    }
}

pub async fn add_member(state: &AppState, email: &str) -> Member {
    member::create(state, member_create(email)).await.unwrap()
}

/// Total, tier and activities (newest first) of a member
pub async fn giving(state: &AppState, member_id: i64) -> (Decimal, Tier, Vec<MemberActivity>) {
    let mut tx = state.store.begin().await.unwrap();
    let member = tx.find_member(member_id).await.unwrap().unwrap();
    let activities = tx.list_activities(member_id).await.unwrap();
    (member.total_donated, member.tier, activities)
}

/// A published event starting tomorrow
pub fn event_create(capacity: Option<i32>) -> EventCreate {
    EventCreate {
        title: "Spring Gala".into(),
        description: None,
        location: Some("Guild Hall".into()),
        status: Some(EventStatus::Published),
        starts_at: now_millis() + 86_400_000,
        ends_at: None,
        capacity,
        registration_deadline: None,
    }
}

pub async fn add_event(state: &AppState, capacity: Option<i32>) -> Event {
    event::create(state, event_create(capacity)).await.unwrap()
}
