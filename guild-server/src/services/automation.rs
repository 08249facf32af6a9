//! Automation trigger dispatcher
//!
//! Flow for one dispatch:
//! 1. load the automation (404) and reject inactive ones (400)
//! 2. check the ids the trigger needs (400, no side effect, no log row)
//! 3. resolve member / donation / event (404)
//! 4. hand a [`Notification`] to the notifier
//! 5. failure: failed log row + 500; success: `run_count += 1`, `last_run`,
//!    success log row
//!
//! There are no retries; a failed dispatch is final for that invocation.

use serde_json::json;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Automation, AutomationCreate, AutomationLog, AutomationUpdate, CommunicationChannel, Donation,
    Event, Member, NewAutomation, NewAutomationLog, TriggerData, TriggerRequest, TriggerResult,
    TriggerType,
};
use shared::util::now_millis;

use crate::error::{ServiceError, ServiceResult};
use crate::services::notifier::Notification;
use crate::state::AppState;

fn automation_not_found(id: i64) -> AppError {
    AppError::with_message(
        ErrorCode::AutomationNotFound,
        format!("Automation {id} not found"),
    )
    .with_detail("automation_id", id)
}

pub async fn list(state: &AppState) -> ServiceResult<Vec<Automation>> {
    let mut tx = state.store.begin().await?;
    Ok(tx.list_automations().await?)
}

pub async fn get(state: &AppState, id: i64) -> ServiceResult<Automation> {
    let mut tx = state.store.begin().await?;
    Ok(tx
        .find_automation(id)
        .await?
        .ok_or_else(|| automation_not_found(id))?)
}

pub async fn create(state: &AppState, data: AutomationCreate) -> ServiceResult<Automation> {
    let name = data.name.trim();
    if name.is_empty() {
        return Err(AppError::required("name").into());
    }
    let trigger_type: TriggerType = data.trigger_type.parse().map_err(|msg: String| {
        AppError::with_message(ErrorCode::UnknownTrigger, msg)
            .with_detail("trigger_type", data.trigger_type.clone())
    })?;

    let actions = if data.actions.is_null() {
        json!([])
    } else {
        data.actions
    };

    let mut tx = state.store.begin().await?;
    let automation = tx
        .insert_automation(
            &NewAutomation {
                name: name.to_string(),
                trigger_type,
                actions,
                is_active: data.is_active.unwrap_or(true),
            },
            now_millis(),
        )
        .await?;
    tx.commit().await?;

    tracing::info!(automation_id = automation.id, trigger = %trigger_type, "Automation created");
    Ok(automation)
}

pub async fn update(state: &AppState, id: i64, data: AutomationUpdate) -> ServiceResult<Automation> {
    if data.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::required("name").into());
    }
    let mut tx = state.store.begin().await?;
    let automation = tx
        .update_automation(id, &data, now_millis())
        .await?
        .ok_or_else(|| automation_not_found(id))?;
    tx.commit().await?;
    Ok(automation)
}

pub async fn delete(state: &AppState, id: i64) -> ServiceResult<()> {
    let mut tx = state.store.begin().await?;
    if !tx.delete_automation(id).await? {
        return Err(automation_not_found(id).into());
    }
    tx.commit().await?;
    Ok(())
}

pub async fn logs(state: &AppState, id: i64) -> ServiceResult<Vec<AutomationLog>> {
    let mut tx = state.store.begin().await?;
    tx.find_automation(id)
        .await?
        .ok_or_else(|| automation_not_found(id))?;
    Ok(tx.list_automation_logs(id).await?)
}

/// `POST /api/automations/{id}/trigger`
pub async fn trigger(
    state: &AppState,
    id: i64,
    request: TriggerRequest,
) -> ServiceResult<TriggerResult> {
    let automation = get(state, id).await?;
    if !automation.is_active {
        return Err(AppError::with_message(
            ErrorCode::AutomationInactive,
            format!("Automation {id} is not active"),
        )
        .into());
    }
    dispatch(state, &automation, request.trigger_data).await
}

/// Fire every active automation registered for `trigger`.
///
/// Used after domain events (new member, donation). Failures are logged
/// and recorded in the automation log; they never reach the caller.
pub async fn fire(state: &AppState, trigger: TriggerType, data: TriggerData) {
    let automations = match state.store.begin().await {
        Ok(mut tx) => tx.active_automations_for(trigger).await,
        Err(e) => Err(e),
    };
    let automations = match automations {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!(trigger = %trigger, error = %e, "Failed to load automations");
            return;
        }
    };

    for automation in &automations {
        if let Err(e) = dispatch(state, automation, data).await {
            let err: AppError = e.into();
            tracing::warn!(
                automation_id = automation.id,
                trigger = %trigger,
                code = %err.code,
                error = %err.message,
                "Automation dispatch failed"
            );
        }
    }
}

/// Entities resolved from trigger data
struct Resolved {
    member: Member,
    donation: Option<Donation>,
    event: Option<Event>,
}

fn missing_ids(trigger: TriggerType, data: &TriggerData) -> Result<(), AppError> {
    let missing = data.missing_for(trigger);
    if missing.is_empty() {
        return Ok(());
    }
    Err(AppError::with_message(
        ErrorCode::MissingTriggerData,
        format!("{trigger} requires {}", missing.join(", ")),
    )
    .with_detail("missing", missing))
}

async fn resolve(state: &AppState, data: &TriggerData) -> ServiceResult<Resolved> {
    let mut tx = state.store.begin().await?;

    // every trigger requires member_id, checked by missing_ids
    let member_id = data.member_id.ok_or_else(|| AppError::required("member_id"))?;
    let member = tx.find_member(member_id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::MemberNotFound, format!("Member {member_id} not found"))
    })?;

    let donation = match data.donation_id {
        Some(donation_id) => {
            let donation = tx.find_donation(donation_id).await?.ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::DonationNotFound,
                    format!("Donation {donation_id} not found"),
                )
            })?;
            if donation.member_id != member.id {
                return Err(AppError::validation(format!(
                    "Donation {donation_id} does not belong to member {member_id}"
                ))
                .into());
            }
            Some(donation)
        }
        None => None,
    };

    let event = match data.event_id {
        Some(event_id) => Some(tx.find_event(event_id).await?.ok_or_else(|| {
            AppError::with_message(ErrorCode::EventNotFound, format!("Event {event_id} not found"))
        })?),
        None => None,
    };

    Ok(Resolved {
        member,
        donation,
        event,
    })
}

fn build_notification(
    automation: &Automation,
    data: &TriggerData,
    resolved: &Resolved,
) -> Notification {
    let member = &resolved.member;
    let event_title = resolved
        .event
        .as_ref()
        .map(|e| e.title.as_str())
        .unwrap_or("our event");

    let (subject, body) = match automation.trigger_type {
        TriggerType::MemberOnboarding => (
            format!("Welcome to the guild, {}!", member.first_name),
            format!(
                "Dear {}, thank you for joining. We are glad to have you with us.",
                member.full_name()
            ),
        ),
        TriggerType::DonationAcknowledgment => {
            let (amount, receipt) = resolved
                .donation
                .as_ref()
                .map(|d| (format!("${:.2}", d.amount), d.receipt_number.clone()))
                .unwrap_or_default();
            (
                format!("Thank you for your gift of {amount}"),
                format!(
                    "Dear {}, we received your donation of {amount}. Your receipt number is {receipt}.",
                    member.full_name()
                ),
            )
        }
        TriggerType::EventReminder => (
            format!("Reminder: {event_title}"),
            format!("Dear {}, this is a reminder about {event_title}.", member.full_name()),
        ),
        TriggerType::EventFollowUp => (
            format!("Thank you for joining {event_title}"),
            format!(
                "Dear {}, thank you for being part of {event_title}.",
                member.full_name()
            ),
        ),
        TriggerType::TierUpgrade => (
            format!("You are now a {} member", member.tier),
            format!(
                "Dear {}, your generosity has moved you to the {} tier.",
                member.full_name(),
                member.tier
            ),
        ),
    };

    Notification {
        kind: automation.trigger_type.to_string(),
        channel: CommunicationChannel::Email,
        member_id: member.id,
        to: member.email.clone(),
        recipient_name: member.full_name(),
        subject,
        body,
        context: json!({
            "automation_id": automation.id,
            "automation_name": automation.name,
            "actions": automation.actions,
            "trigger_data": data,
            "tier": member.tier,
        }),
    }
}

async fn dispatch(
    state: &AppState,
    automation: &Automation,
    data: TriggerData,
) -> ServiceResult<TriggerResult> {
    missing_ids(automation.trigger_type, &data)?;
    let resolved = resolve(state, &data).await?;
    let notification = build_notification(automation, &data, &resolved);

    let outcome = state.notifier.send(&notification).await;
    let now = now_millis();
    let mut tx = state.store.begin().await?;

    match outcome {
        Ok(()) => {
            let updated = tx.record_automation_run(automation.id, now).await?;
            let log = tx
                .insert_automation_log(
                    &NewAutomationLog {
                        automation_id: automation.id,
                        trigger_type: automation.trigger_type,
                        success: true,
                        error_message: None,
                        trigger_data: data,
                    },
                    now,
                )
                .await?;
            tx.commit().await?;
            tracing::info!(
                automation_id = automation.id,
                trigger = %automation.trigger_type,
                run_count = updated.run_count,
                "Automation executed"
            );
            Ok(TriggerResult {
                automation: updated,
                log,
            })
        }
        Err(e) => {
            tx.insert_automation_log(
                &NewAutomationLog {
                    automation_id: automation.id,
                    trigger_type: automation.trigger_type,
                    success: false,
                    error_message: Some(e.to_string()),
                    trigger_data: data,
                },
                now,
            )
            .await?;
            tx.commit().await?;
            tracing::error!(
                automation_id = automation.id,
                trigger = %automation.trigger_type,
                error = %e,
                "Automation execution failed"
            );
            Err(ServiceError::App(
                AppError::new(ErrorCode::AutomationExecutionFailed)
                    .with_detail("automation_id", automation.id),
            ))
        }
    }
}
