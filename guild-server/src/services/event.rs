//! Event management

use shared::error::{AppError, ErrorCode};
use shared::models::{Event, EventCreate, EventUpdate};
use shared::util::now_millis;

use crate::error::ServiceResult;
use crate::services::registration::fill_open_slots;
use crate::state::AppState;

pub(crate) fn event_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::EventNotFound, format!("Event {id} not found"))
        .with_detail("event_id", id)
}

fn validate_capacity(capacity: Option<i32>) -> Result<(), AppError> {
    match capacity {
        Some(cap) if cap <= 0 => Err(AppError::new(ErrorCode::InvalidCapacity)
            .with_detail("capacity", cap)),
        _ => Ok(()),
    }
}

fn validate_window(starts_at: i64, ends_at: Option<i64>) -> Result<(), AppError> {
    if ends_at.is_some_and(|end| end < starts_at) {
        return Err(AppError::validation("ends_at must not be before starts_at")
            .with_detail("field", "ends_at"));
    }
    Ok(())
}

pub async fn list(state: &AppState) -> ServiceResult<Vec<Event>> {
    let mut tx = state.store.begin().await?;
    Ok(tx.list_events().await?)
}

pub async fn get(state: &AppState, id: i64) -> ServiceResult<Event> {
    let mut tx = state.store.begin().await?;
    Ok(tx.find_event(id).await?.ok_or_else(|| event_not_found(id))?)
}

pub async fn create(state: &AppState, mut data: EventCreate) -> ServiceResult<Event> {
    data.title = data.title.trim().to_string();
    if data.title.is_empty() {
        return Err(AppError::required("title").into());
    }
    validate_capacity(data.capacity)?;
    validate_window(data.starts_at, data.ends_at)?;

    let mut tx = state.store.begin().await?;
    let event = tx.insert_event(&data, now_millis()).await?;
    tx.commit().await?;

    tracing::info!(event_id = event.id, capacity = ?event.capacity, "Event created");
    Ok(event)
}

/// Update an event. Raising the capacity (or removing it) promotes
/// waitlisted registrations; lowering it below the confirmed count is
/// rejected.
pub async fn update(state: &AppState, id: i64, mut data: EventUpdate) -> ServiceResult<Event> {
    if let Some(title) = &data.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::required("title").into());
        }
        data.title = Some(title.to_string());
    }
    validate_capacity(data.capacity.flatten())?;

    let now = now_millis();
    let mut tx = state.store.begin().await?;
    let current = tx.lock_event(id).await?.ok_or_else(|| event_not_found(id))?;

    validate_window(
        data.starts_at.unwrap_or(current.starts_at),
        data.ends_at.or(current.ends_at),
    )?;

    if let Some(Some(cap)) = data.capacity {
        let holders = tx.count_slot_holders(id).await?;
        if holders > i64::from(cap) {
            return Err(AppError::with_message(
                ErrorCode::InvalidCapacity,
                format!("Capacity {cap} is below the {holders} confirmed registrations"),
            )
            .with_detail("capacity", cap)
            .into());
        }
    }

    let mut event = tx
        .update_event(id, &data, now)
        .await?
        .ok_or_else(|| event_not_found(id))?;

    if data.capacity.is_some_and(|cap| current.capacity != cap) {
        let promoted = fill_open_slots(&mut tx, &event, now).await?;
        if !promoted.is_empty() {
            tracing::info!(event_id = id, promoted = promoted.len(), "Capacity raised, waitlist promoted");
        }
        event = tx.find_event(id).await?.ok_or_else(|| event_not_found(id))?;
    }
    tx.commit().await?;
    Ok(event)
}

/// Delete an event together with its registrations
pub async fn delete(state: &AppState, id: i64) -> ServiceResult<()> {
    let mut tx = state.store.begin().await?;
    if !tx.delete_event(id).await? {
        return Err(event_not_found(id).into());
    }
    tx.commit().await?;
    tracing::info!(event_id = id, "Event deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::registration;
    use crate::services::test_support::{add_event, add_member, event_create, test_state};
    use shared::models::{RegistrationCreate, RegistrationStatus};

    #[tokio::test]
    async fn test_create_validation() {
        let (state, _) = test_state();

        let mut data = event_create(Some(0));
        let err: AppError = create(&state, data.clone()).await.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::InvalidCapacity);

        data.capacity = Some(10);
        data.title = "  ".into();
        let err: AppError = create(&state, data.clone()).await.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::RequiredField);

        data.title = "Gala".into();
        data.ends_at = Some(data.starts_at - 1);
        let err: AppError = create(&state, data).await.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn test_capacity_raise_promotes_waitlist() {
        let (state, _) = test_state();
        let event = add_event(&state, Some(1)).await;
        for email in ["a@example.org", "b@example.org", "c@example.org"] {
            let member = add_member(&state, email).await;
            registration::register(
                &state,
                event.id,
                RegistrationCreate {
                    member_id: Some(member.id),
                    guests: None,
                },
            )
            .await
            .unwrap();
        }

        let event = update(
            &state,
            event.id,
            EventUpdate {
                capacity: Some(Some(2)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(event.capacity, Some(2));
        assert_eq!(event.current_registrations, 2);

        let regs = registration::list(&state, event.id).await.unwrap();
        let pending = regs
            .iter()
            .filter(|r| r.status == RegistrationStatus::Pending)
            .count();
        assert_eq!(pending, 1);

        let err: AppError = update(
            &state,
            event.id,
            EventUpdate {
                capacity: Some(Some(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err()
        .into();
        assert_eq!(err.code, ErrorCode::InvalidCapacity);
    }

    #[tokio::test]
    async fn test_removing_capacity_confirms_waitlist() {
        let (state, _) = test_state();
        let event = add_event(&state, Some(1)).await;
        for email in ["a@example.org", "b@example.org", "c@example.org"] {
            let member = add_member(&state, email).await;
            registration::register(
                &state,
                event.id,
                RegistrationCreate {
                    member_id: Some(member.id),
                    guests: None,
                },
            )
            .await
            .unwrap();
        }

        let event = update(
            &state,
            event.id,
            EventUpdate {
                capacity: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(event.capacity, None);
        assert_eq!(event.current_registrations, 3);

        let regs = registration::list(&state, event.id).await.unwrap();
        assert!(regs.iter().all(|r| r.status == RegistrationStatus::Confirmed));

        // leaving the field out keeps the event unlimited
        let event = update(
            &state,
            event.id,
            EventUpdate {
                title: Some("Autumn Gala".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(event.capacity, None);
    }

    #[tokio::test]
    async fn test_delete_event() {
        let (state, _) = test_state();
        let event = add_event(&state, None).await;
        delete(&state, event.id).await.unwrap();

        let err: AppError = get(&state, event.id).await.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::EventNotFound);
        let err: AppError = delete(&state, event.id).await.unwrap_err().into();
        assert_eq!(err.http_status(), http::StatusCode::NOT_FOUND);
    }
}
