//! Event and EventRegistration Models

use serde::{Deserialize, Deserializer, Serialize};

/// Event lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "event_status", rename_all = "snake_case"))]
pub enum EventStatus {
    #[default]
    Draft,
    Published,
    Active,
    Completed,
    Cancelled,
}

impl EventStatus {
    /// Only published and active events take registrations
    pub fn accepts_registrations(self) -> bool {
        matches!(self, EventStatus::Published | EventStatus::Active)
    }
}

/// Guild event with optional capacity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: EventStatus,
    pub starts_at: i64,
    pub ends_at: Option<i64>,
    /// `None` = unlimited
    pub capacity: Option<i32>,
    /// Number of registrations holding a confirmed slot
    pub current_registrations: i32,
    pub registration_deadline: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Event {
    /// True when a capacity is set and the confirmed counter has reached it
    pub fn is_full(&self) -> bool {
        self.capacity
            .is_some_and(|cap| self.current_registrations >= cap)
    }

    /// True when the deadline is set and `now` is past it
    pub fn deadline_passed(&self, now: i64) -> bool {
        self.registration_deadline.is_some_and(|d| now > d)
    }
}

/// Create event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCreate {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: Option<EventStatus>,
    pub starts_at: i64,
    pub ends_at: Option<i64>,
    pub capacity: Option<i32>,
    pub registration_deadline: Option<i64>,
}

/// Update event payload (the counter is not editable)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: Option<EventStatus>,
    pub starts_at: Option<i64>,
    pub ends_at: Option<i64>,
    /// Absent: unchanged. `null`: unlimited. A number: new limit.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub capacity: Option<Option<i32>>,
    pub registration_deadline: Option<i64>,
}

/// Wraps a field that is present in the payload (even as `null`) in `Some`
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Registration status; `Pending` means waitlisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "registration_status", rename_all = "snake_case")
)]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Attended,
    NoShow,
}

impl RegistrationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RegistrationStatus::Cancelled | RegistrationStatus::Attended | RegistrationStatus::NoShow
        )
    }

    /// Allowed moves:
    ///
    /// ```text
    /// pending   -> confirmed | cancelled
    /// confirmed -> cancelled | no_show | attended
    /// ```
    pub fn can_transition_to(self, next: RegistrationStatus) -> bool {
        use RegistrationStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
                | (Confirmed, Attended)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::Attended => "attended",
            RegistrationStatus::NoShow => "no_show",
        }
    }
}

/// A member's registration for one event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct EventRegistration {
    pub id: i64,
    pub event_id: i64,
    pub member_id: i64,
    pub status: RegistrationStatus,
    pub guests: i32,
    /// Waitlist order key (FIFO)
    pub registration_date: i64,
    pub updated_at: i64,
}

/// Register payload (`POST /api/events/{id}/registrations`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationCreate {
    pub member_id: Option<i64>,
    pub guests: Option<i32>,
}

/// Status change payload (`PATCH /api/events/{id}/registrations/{reg_id}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationStatusUpdate {
    pub status: RegistrationStatus,
}

/// Validated insert row
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub event_id: i64,
    pub member_id: i64,
    pub status: RegistrationStatus,
    pub guests: i32,
    pub registration_date: i64,
}

/// Register response: the row plus a confirmed/waitlisted message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationOutcome {
    pub registration: EventRegistration,
    pub waitlisted: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use RegistrationStatus::*;

    #[test]
    fn test_allowed_transitions() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(NoShow));
        assert!(Confirmed.can_transition_to(Attended));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!Pending.can_transition_to(Attended));
        assert!(!Pending.can_transition_to(NoShow));
        assert!(!Confirmed.can_transition_to(Pending));
        for terminal in [Cancelled, Attended, NoShow] {
            assert!(terminal.is_terminal());
            for next in [Pending, Confirmed, Cancelled, Attended, NoShow] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_event_is_full() {
        let mut event = Event {
            id: 1,
            title: "Gala".into(),
            description: None,
            location: None,
            status: EventStatus::Published,
            starts_at: 0,
            ends_at: None,
            capacity: Some(2),
            current_registrations: 1,
            registration_deadline: Some(1_000),
            created_at: 0,
            updated_at: 0,
        };
        assert!(!event.is_full());
        event.current_registrations = 2;
        assert!(event.is_full());
        event.capacity = None;
        assert!(!event.is_full());

        assert!(!event.deadline_passed(1_000));
        assert!(event.deadline_passed(1_001));
    }

    #[test]
    fn test_update_capacity_presence() {
        let unchanged: EventUpdate = serde_json::from_str(r#"{"title":"Gala"}"#).unwrap();
        assert_eq!(unchanged.capacity, None);
        let unlimited: EventUpdate = serde_json::from_str(r#"{"capacity":null}"#).unwrap();
        assert_eq!(unlimited.capacity, Some(None));
        let limited: EventUpdate = serde_json::from_str(r#"{"capacity":40}"#).unwrap();
        assert_eq!(limited.capacity, Some(Some(40)));
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(serde_json::to_string(&NoShow).unwrap(), "\"no_show\"");
        assert!(EventStatus::Active.accepts_registrations());
        assert!(!EventStatus::Draft.accepts_registrations());
    }
}
