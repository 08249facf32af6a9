//! Event registrations: capacity and waitlist
//!
//! `current_registrations` always equals the number of registrations holding
//! a slot (`confirmed` or `attended`). It is recounted inside the transaction
//! after every change, with the event row locked.
//!
//! A registration that arrives while the event is full is stored as
//! `pending`. When a confirmed slot frees up the oldest pending registration
//! (by `registration_date`, then id) is promoted.

use shared::error::{AppError, ErrorCode};
use shared::models::{
    ActivityType, Event, EventRegistration, NewActivity, NewRegistration, RegistrationCreate,
    RegistrationOutcome, RegistrationStatus,
};
use shared::util::now_millis;

use crate::db::{RepoError, StoreTx};
use crate::error::{ServiceError, ServiceResult};
use crate::services::event::event_not_found;
use crate::services::member::member_not_found;
use crate::state::AppState;

const MSG_CONFIRMED: &str = "Registration confirmed";
const MSG_WAITLISTED: &str = "You're on the waitlist";

fn registration_not_found(event_id: i64, registration_id: i64) -> AppError {
    AppError::with_message(
        ErrorCode::RegistrationNotFound,
        format!("Registration {registration_id} not found for event {event_id}"),
    )
    .with_detail("registration_id", registration_id)
}

fn already_registered(member_id: i64, event_id: i64) -> AppError {
    AppError::new(ErrorCode::AlreadyRegistered)
        .with_detail("member_id", member_id)
        .with_detail("event_id", event_id)
}

fn has_open_slot(event: &Event, holders: i64) -> bool {
    event.capacity.is_none_or(|cap| holders < i64::from(cap))
}

async fn lock_event(tx: &mut Box<dyn StoreTx>, event_id: i64) -> ServiceResult<Event> {
    Ok(tx
        .lock_event(event_id)
        .await?
        .ok_or_else(|| event_not_found(event_id))?)
}

/// Promote pending registrations while the event has free slots, then store
/// the recounted slot total. Returns the promoted registrations.
pub(crate) async fn fill_open_slots(
    tx: &mut Box<dyn StoreTx>,
    event: &Event,
    now: i64,
) -> ServiceResult<Vec<EventRegistration>> {
    let mut holders = tx.count_slot_holders(event.id).await?;
    let mut promoted = Vec::new();

    while has_open_slot(event, holders) {
        let Some(next) = tx.oldest_pending(event.id).await? else {
            break;
        };
        let registration = tx
            .set_registration_status(next.id, RegistrationStatus::Confirmed, now)
            .await?;
        tx.insert_activity(
            &NewActivity::new(
                registration.member_id,
                ActivityType::RegistrationStatus,
                format!("Promoted from the waitlist for {}", event.title),
            ),
            now,
        )
        .await?;
        tracing::info!(
            event_id = event.id,
            registration_id = registration.id,
            member_id = registration.member_id,
            "Waitlisted registration promoted"
        );
        holders += 1;
        promoted.push(registration);
    }

    store_count(tx, event, holders, now).await?;
    Ok(promoted)
}

async fn store_count(
    tx: &mut Box<dyn StoreTx>,
    event: &Event,
    holders: i64,
    now: i64,
) -> ServiceResult<()> {
    let count = i32::try_from(holders)
        .map_err(|_| AppError::internal(format!("Registration count overflow on event {}", event.id)))?;
    tx.set_event_registrations(event.id, count, now).await?;
    Ok(())
}

pub async fn list(state: &AppState, event_id: i64) -> ServiceResult<Vec<EventRegistration>> {
    let mut tx = state.store.begin().await?;
    tx.find_event(event_id)
        .await?
        .ok_or_else(|| event_not_found(event_id))?;
    Ok(tx.list_registrations(event_id).await?)
}

/// Register a member; waitlisted (`pending`) when the event is full.
pub async fn register(
    state: &AppState,
    event_id: i64,
    data: RegistrationCreate,
) -> ServiceResult<RegistrationOutcome> {
    let member_id = data.member_id.ok_or_else(|| AppError::required("member_id"))?;
    let guests = data.guests.unwrap_or(0);
    if guests < 0 {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "guests must not be negative",
        )
        .with_detail("field", "guests")
        .into());
    }

    let now = now_millis();
    let mut tx = state.store.begin().await?;
    let event = lock_event(&mut tx, event_id).await?;
    let member = tx
        .find_member(member_id)
        .await?
        .ok_or_else(|| member_not_found(member_id))?;

    if !event.status.accepts_registrations() {
        return Err(AppError::new(ErrorCode::EventNotOpen)
            .with_detail("event_id", event_id)
            .into());
    }
    if event.deadline_passed(now) {
        return Err(AppError::new(ErrorCode::RegistrationClosed)
            .with_detail("event_id", event_id)
            .into());
    }
    if tx.find_member_registration(event_id, member_id).await?.is_some() {
        return Err(already_registered(member_id, event_id).into());
    }

    let holders = tx.count_slot_holders(event_id).await?;
    let waitlisted = !has_open_slot(&event, holders);
    let status = if waitlisted {
        RegistrationStatus::Pending
    } else {
        RegistrationStatus::Confirmed
    };

    let registration = tx
        .insert_registration(&NewRegistration {
            event_id,
            member_id,
            status,
            guests,
            registration_date: now,
        })
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => already_registered(member_id, event_id).into(),
            other => ServiceError::from(other),
        })?;

    if !waitlisted {
        store_count(&mut tx, &event, holders + 1, now).await?;
    }

    let description = if waitlisted {
        format!("Joined the waitlist for {}", event.title)
    } else {
        format!("Registered for {}", event.title)
    };
    tx.insert_activity(
        &NewActivity::new(member.id, ActivityType::EventRegistration, description),
        now,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        event_id,
        member_id,
        registration_id = registration.id,
        status = registration.status.as_str(),
        "Event registration created"
    );

    Ok(RegistrationOutcome {
        registration,
        waitlisted,
        message: if waitlisted { MSG_WAITLISTED } else { MSG_CONFIRMED }.to_string(),
    })
}

/// Move a registration through its state machine.
///
/// Requesting the current status is a no-op that returns the registration.
pub async fn change_status(
    state: &AppState,
    event_id: i64,
    registration_id: i64,
    next: RegistrationStatus,
) -> ServiceResult<EventRegistration> {
    let now = now_millis();
    let mut tx = state.store.begin().await?;
    let event = lock_event(&mut tx, event_id).await?;
    let current = tx
        .find_registration(event_id, registration_id)
        .await?
        .ok_or_else(|| registration_not_found(event_id, registration_id))?;

    if current.status == next {
        return Ok(current);
    }
    if !current.status.can_transition_to(next) {
        return Err(AppError::with_message(
            ErrorCode::InvalidStatusTransition,
            format!(
                "Cannot change registration from {} to {}",
                current.status.as_str(),
                next.as_str()
            ),
        )
        .with_detail("from", current.status.as_str())
        .with_detail("to", next.as_str())
        .into());
    }

    if next == RegistrationStatus::Confirmed {
        let holders = tx.count_slot_holders(event_id).await?;
        if !has_open_slot(&event, holders) {
            return Err(AppError::new(ErrorCode::EventAtCapacity)
                .with_detail("event_id", event_id)
                .into());
        }
    }

    let registration = tx
        .set_registration_status(registration_id, next, now)
        .await?;

    let description = match next {
        RegistrationStatus::Cancelled => format!("Cancelled registration for {}", event.title),
        RegistrationStatus::Attended => format!("Attended event {}", event.title),
        _ => format!(
            "Registration for {} changed from {} to {}",
            event.title,
            current.status.as_str(),
            next.as_str()
        ),
    };
    tx.insert_activity(
        &NewActivity::new(
            registration.member_id,
            ActivityType::RegistrationStatus,
            description,
        ),
        now,
    )
    .await?;

    let released = current.status == RegistrationStatus::Confirmed
        && matches!(next, RegistrationStatus::Cancelled | RegistrationStatus::NoShow);
    if released {
        fill_open_slots(&mut tx, &event, now).await?;
    } else {
        let holders = tx.count_slot_holders(event_id).await?;
        store_count(&mut tx, &event, holders, now).await?;
    }
    tx.commit().await?;

    tracing::info!(
        event_id,
        registration_id,
        from = current.status.as_str(),
        to = next.as_str(),
        "Registration status changed"
    );
    Ok(registration)
}

/// Remove a registration; a freed confirmed slot goes to the waitlist.
pub async fn delete(state: &AppState, event_id: i64, registration_id: i64) -> ServiceResult<()> {
    let now = now_millis();
    let mut tx = state.store.begin().await?;
    let event = lock_event(&mut tx, event_id).await?;
    let registration = tx
        .find_registration(event_id, registration_id)
        .await?
        .ok_or_else(|| registration_not_found(event_id, registration_id))?;

    if !tx.delete_registration(registration_id).await? {
        return Err(registration_not_found(event_id, registration_id).into());
    }

    if registration.status == RegistrationStatus::Confirmed {
        fill_open_slots(&mut tx, &event, now).await?;
    } else {
        let holders = tx.count_slot_holders(event_id).await?;
        store_count(&mut tx, &event, holders, now).await?;
    }

    tx.insert_activity(
        &NewActivity::new(
            registration.member_id,
            ActivityType::RegistrationStatus,
            format!("Cancelled registration for {}", event.title),
        ),
        now,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(event_id, registration_id, "Registration deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::event;
    use crate::services::test_support::{add_event, add_member, giving, test_state};
    use shared::models::{EventStatus, EventUpdate, Member};
    use RegistrationStatus::*;

    async fn members(state: &AppState, n: usize) -> Vec<Member> {
        let mut out = Vec::new();
        for i in 0..n {
            out.push(add_member(state, &format!("m{i}@example.org")).await);
        }
        out
    }

    async fn join(state: &AppState, event_id: i64, member_id: i64) -> RegistrationOutcome {
        register(
            state,
            event_id,
            RegistrationCreate {
                member_id: Some(member_id),
                guests: None,
            },
        )
        .await
        .unwrap()
    }

    async fn counter(state: &AppState, event_id: i64) -> i32 {
        event::get(state, event_id).await.unwrap().current_registrations
    }

    fn code_of<T: std::fmt::Debug>(result: ServiceResult<T>) -> ErrorCode {
        let err: AppError = result.unwrap_err().into();
        err.code
    }

    #[tokio::test]
    async fn test_capacity_then_waitlist() {
        let (state, _) = test_state();
        let event = add_event(&state, Some(2)).await;
        let people = members(&state, 3).await;

        let first = join(&state, event.id, people[0].id).await;
        let second = join(&state, event.id, people[1].id).await;
        let third = join(&state, event.id, people[2].id).await;

        assert!(!first.waitlisted);
        assert_eq!(first.message, "Registration confirmed");
        assert_eq!(second.registration.status, Confirmed);
        assert!(third.waitlisted);
        assert_eq!(third.registration.status, Pending);
        assert_eq!(third.message, "You're on the waitlist");
        assert_eq!(counter(&state, event.id).await, 2);
    }

    #[tokio::test]
    async fn test_unlimited_capacity_never_waitlists() {
        let (state, _) = test_state();
        let event = add_event(&state, None).await;
        for member in members(&state, 5).await {
            assert!(!join(&state, event.id, member.id).await.waitlisted);
        }
        assert_eq!(counter(&state, event.id).await, 5);
    }

    #[tokio::test]
    async fn test_cancel_promotes_oldest_pending() {
        let (state, _) = test_state();
        let event = add_event(&state, Some(1)).await;
        let people = members(&state, 3).await;

        let holder = join(&state, event.id, people[0].id).await.registration;
        let early = join(&state, event.id, people[1].id).await.registration;
        let late = join(&state, event.id, people[2].id).await.registration;

        change_status(&state, event.id, holder.id, Cancelled)
            .await
            .unwrap();

        let regs = list(&state, event.id).await.unwrap();
        let status_of = |id: i64| regs.iter().find(|r| r.id == id).unwrap().status;
        assert_eq!(status_of(holder.id), Cancelled);
        assert_eq!(status_of(early.id), Confirmed);
        assert_eq!(status_of(late.id), Pending);
        assert_eq!(counter(&state, event.id).await, 1);
    }

    #[tokio::test]
    async fn test_confirm_rejected_when_full() {
        let (state, _) = test_state();
        let event = add_event(&state, Some(1)).await;
        let people = members(&state, 2).await;

        join(&state, event.id, people[0].id).await;
        let waiting = join(&state, event.id, people[1].id).await.registration;

        let err: AppError = change_status(&state, event.id, waiting.id, Confirmed)
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::EventAtCapacity);
        assert_eq!(err.message, "Event is at capacity");
        assert_eq!(counter(&state, event.id).await, 1);
    }

    #[tokio::test]
    async fn test_transitions() {
        let (state, _) = test_state();
        let event = add_event(&state, Some(3)).await;
        let people = members(&state, 2).await;
        let reg = join(&state, event.id, people[0].id).await.registration;

        // same status is a no-op
        let same = change_status(&state, event.id, reg.id, Confirmed)
            .await
            .unwrap();
        assert_eq!(same, reg);

        assert_eq!(
            code_of(change_status(&state, event.id, reg.id, Pending).await),
            ErrorCode::InvalidStatusTransition
        );

        // attended keeps its slot
        change_status(&state, event.id, reg.id, Attended)
            .await
            .unwrap();
        assert_eq!(counter(&state, event.id).await, 1);
        assert_eq!(
            code_of(change_status(&state, event.id, reg.id, Cancelled).await),
            ErrorCode::InvalidStatusTransition
        );

        let other = join(&state, event.id, people[1].id).await.registration;
        change_status(&state, event.id, other.id, NoShow)
            .await
            .unwrap();
        assert_eq!(counter(&state, event.id).await, 1);

        assert_eq!(
            code_of(change_status(&state, event.id, 999, Cancelled).await),
            ErrorCode::RegistrationNotFound
        );
    }

    #[tokio::test]
    async fn test_register_rejections() {
        let (state, _) = test_state();
        let event = add_event(&state, Some(5)).await;
        let member = add_member(&state, "ada@example.org").await;
        join(&state, event.id, member.id).await;

        let again = register(
            &state,
            event.id,
            RegistrationCreate {
                member_id: Some(member.id),
                guests: Some(1),
            },
        )
        .await;
        assert_eq!(code_of(again), ErrorCode::AlreadyRegistered);

        let missing_member = register(
            &state,
            event.id,
            RegistrationCreate {
                member_id: Some(404),
                guests: None,
            },
        )
        .await;
        assert_eq!(code_of(missing_member), ErrorCode::MemberNotFound);

        let missing_event = register(
            &state,
            404,
            RegistrationCreate {
                member_id: Some(member.id),
                guests: None,
            },
        )
        .await;
        assert_eq!(code_of(missing_event), ErrorCode::EventNotFound);

        let draft = event::update(
            &state,
            event.id,
            EventUpdate {
                status: Some(EventStatus::Draft),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let other = add_member(&state, "grace@example.org").await;
        let not_open = register(
            &state,
            draft.id,
            RegistrationCreate {
                member_id: Some(other.id),
                guests: None,
            },
        )
        .await;
        assert_eq!(code_of(not_open), ErrorCode::EventNotOpen);
    }

    #[tokio::test]
    async fn test_deadline_passed() {
        let (state, _) = test_state();
        let event = add_event(&state, None).await;
        event::update(
            &state,
            event.id,
            EventUpdate {
                registration_deadline: Some(now_millis() - 60_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let member = add_member(&state, "ada@example.org").await;

        let result = register(
            &state,
            event.id,
            RegistrationCreate {
                member_id: Some(member.id),
                guests: None,
            },
        )
        .await;
        assert_eq!(code_of(result), ErrorCode::RegistrationClosed);
    }

    #[tokio::test]
    async fn test_delete_confirmed_promotes() {
        let (state, _) = test_state();
        let event = add_event(&state, Some(1)).await;
        let people = members(&state, 2).await;
        let holder = join(&state, event.id, people[0].id).await.registration;
        let waiting = join(&state, event.id, people[1].id).await.registration;

        delete(&state, event.id, holder.id).await.unwrap();

        let regs = list(&state, event.id).await.unwrap();
        assert_eq!(regs.len(), 1);
        assert_eq!(regs[0].id, waiting.id);
        assert_eq!(regs[0].status, Confirmed);
        assert_eq!(counter(&state, event.id).await, 1);

        assert_eq!(
            code_of(delete(&state, event.id, holder.id).await),
            ErrorCode::RegistrationNotFound
        );
    }

    #[tokio::test]
    async fn test_no_show_promotes_oldest_pending() {
        let (state, _) = test_state();
        let event = add_event(&state, Some(1)).await;
        let people = members(&state, 3).await;

        let holder = join(&state, event.id, people[0].id).await.registration;
        let early = join(&state, event.id, people[1].id).await.registration;
        let late = join(&state, event.id, people[2].id).await.registration;

        change_status(&state, event.id, holder.id, NoShow)
            .await
            .unwrap();

        let regs = list(&state, event.id).await.unwrap();
        let status_of = |id: i64| regs.iter().find(|r| r.id == id).unwrap().status;
        assert_eq!(status_of(holder.id), NoShow);
        assert_eq!(status_of(early.id), Confirmed);
        assert_eq!(status_of(late.id), Pending);
        assert_eq!(counter(&state, event.id).await, 1);

        let (_, _, activities) = giving(&state, people[1].id).await;
        assert_eq!(activities[0].activity_type, ActivityType::RegistrationStatus);
        assert!(activities[0].description.starts_with("Promoted from the waitlist"));
    }

    #[tokio::test]
    async fn test_cancel_pending_keeps_slots() {
        let (state, _) = test_state();
        let event = add_event(&state, Some(1)).await;
        let people = members(&state, 3).await;

        let holder = join(&state, event.id, people[0].id).await.registration;
        let early = join(&state, event.id, people[1].id).await.registration;
        let late = join(&state, event.id, people[2].id).await.registration;

        change_status(&state, event.id, early.id, Cancelled)
            .await
            .unwrap();

        let regs = list(&state, event.id).await.unwrap();
        let status_of = |id: i64| regs.iter().find(|r| r.id == id).unwrap().status;
        assert_eq!(status_of(holder.id), Confirmed);
        assert_eq!(status_of(early.id), Cancelled);
        assert_eq!(status_of(late.id), Pending);
        assert_eq!(counter(&state, event.id).await, 1);

        let (_, _, activities) = giving(&state, people[1].id).await;
        assert_eq!(
            activities[0].description,
            format!("Cancelled registration for {}", event.title)
        );
    }

    #[tokio::test]
    async fn test_status_activity_descriptions() {
        let (state, _) = test_state();
        let event = add_event(&state, None).await;
        let member = add_member(&state, "ada@example.org").await;
        let reg = join(&state, event.id, member.id).await.registration;

        change_status(&state, event.id, reg.id, Attended)
            .await
            .unwrap();
        let (_, _, activities) = giving(&state, member.id).await;
        assert_eq!(activities[0].activity_type, ActivityType::RegistrationStatus);
        assert_eq!(
            activities[0].description,
            format!("Attended event {}", event.title)
        );
    }

    #[tokio::test]
    async fn test_delete_pending_and_attended_record_activity() {
        let (state, _) = test_state();
        let event = add_event(&state, Some(1)).await;
        let people = members(&state, 2).await;

        let holder = join(&state, event.id, people[0].id).await.registration;
        let waiting = join(&state, event.id, people[1].id).await.registration;
        change_status(&state, event.id, holder.id, Attended)
            .await
            .unwrap();

        delete(&state, event.id, waiting.id).await.unwrap();
        let (_, _, activities) = giving(&state, people[1].id).await;
        assert_eq!(activities[0].activity_type, ActivityType::RegistrationStatus);
        assert_eq!(
            activities[0].description,
            format!("Cancelled registration for {}", event.title)
        );
        assert_eq!(counter(&state, event.id).await, 1);

        // an attended registration is removed without promoting anyone
        let third = add_member(&state, "late@example.org").await;
        let queued = join(&state, event.id, third.id).await.registration;
        assert_eq!(queued.status, Pending);

        delete(&state, event.id, holder.id).await.unwrap();
        let (_, _, activities) = giving(&state, people[0].id).await;
        assert_eq!(
            activities[0].description,
            format!("Cancelled registration for {}", event.title)
        );
        let regs = list(&state, event.id).await.unwrap();
        assert_eq!(regs.len(), 1);
        assert_eq!(regs[0].status, Pending);
        assert_eq!(counter(&state, event.id).await, 0);
    }

    #[tokio::test]
    async fn test_capacity_never_exceeded() {
        let (state, _) = test_state();
        let event = add_event(&state, Some(3)).await;
        let people = members(&state, 8).await;
        for member in &people {
            join(&state, event.id, member.id).await;
        }
        let regs = list(&state, event.id).await.unwrap();
        let confirmed: Vec<_> = regs.iter().filter(|r| r.status == Confirmed).collect();
        assert_eq!(confirmed.len(), 3);
        assert_eq!(regs.iter().filter(|r| r.status == Pending).count(), 5);
        // FIFO: the first three members hold the slots
        for (reg, member) in confirmed.iter().zip(&people) {
            assert_eq!(reg.member_id, member.id);
        }
        assert_eq!(counter(&state, event.id).await, 3);
    }
}
