//! Bulk communications: drafts, recipients, send and engagement tracking

use serde_json::json;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    ActivityType, Communication, CommunicationChannel, CommunicationCreate, CommunicationRecipient,
    CommunicationStatus, Member, NewActivity, NewCommunication, RecipientMaterialization,
    RecipientTrack, SendReport, TrackingEvent,
};
use shared::util::now_millis;

use crate::db::StoreTx;
use crate::error::ServiceResult;
use crate::services::notifier::Notification;
use crate::services::segmentation;
use crate::state::AppState;

fn communication_not_found(id: i64) -> AppError {
    AppError::with_message(
        ErrorCode::CommunicationNotFound,
        format!("Communication {id} not found"),
    )
    .with_detail("communication_id", id)
}

fn already_sent(id: i64) -> AppError {
    AppError::new(ErrorCode::CommunicationAlreadySent).with_detail("communication_id", id)
}

async fn lock(tx: &mut Box<dyn StoreTx>, id: i64) -> ServiceResult<Communication> {
    Ok(tx
        .lock_communication(id)
        .await?
        .ok_or_else(|| communication_not_found(id))?)
}

pub async fn list(state: &AppState) -> ServiceResult<Vec<Communication>> {
    let mut tx = state.store.begin().await?;
    Ok(tx.list_communications().await?)
}

pub async fn get(state: &AppState, id: i64) -> ServiceResult<Communication> {
    let mut tx = state.store.begin().await?;
    Ok(tx
        .find_communication(id)
        .await?
        .ok_or_else(|| communication_not_found(id))?)
}

/// Create a draft (or a scheduled communication when `scheduled_at` is set).
///
/// `total_recipients` is the current size of the segment union; recipient
/// rows are only written on materialisation or send.
pub async fn create(state: &AppState, data: CommunicationCreate) -> ServiceResult<Communication> {
    let subject = data.subject.trim();
    if subject.is_empty() {
        return Err(AppError::required("subject").into());
    }
    if data.body.trim().is_empty() {
        return Err(AppError::required("body").into());
    }

    let mut tx = state.store.begin().await?;
    let audience = segmentation::resolve(&mut tx, &data.recipient_segments).await?;
    let total_recipients = i32::try_from(audience.len())
        .map_err(|_| AppError::internal("Recipient count does not fit in i32"))?;

    let communication = tx
        .insert_communication(
            &NewCommunication {
                subject: subject.to_string(),
                body: data.body,
                channel: data.channel.unwrap_or_default(),
                status: if data.scheduled_at.is_some() {
                    CommunicationStatus::Scheduled
                } else {
                    CommunicationStatus::Draft
                },
                recipient_segments: data.recipient_segments,
                total_recipients,
                scheduled_at: data.scheduled_at,
            },
            now_millis(),
        )
        .await?;
    tx.commit().await?;

    tracing::info!(
        communication_id = communication.id,
        total_recipients,
        "Communication created"
    );
    Ok(communication)
}

pub async fn delete(state: &AppState, id: i64) -> ServiceResult<()> {
    let mut tx = state.store.begin().await?;
    let communication = lock(&mut tx, id).await?;
    if communication.status == CommunicationStatus::Sent {
        return Err(already_sent(id).into());
    }
    tx.delete_communication(id).await?;
    tx.commit().await?;
    Ok(())
}

/// `POST /api/communications/{id}/recipients`
pub async fn materialize_recipients(
    state: &AppState,
    id: i64,
) -> ServiceResult<RecipientMaterialization> {
    let mut tx = state.store.begin().await?;
    let communication = lock(&mut tx, id).await?;
    let result = segmentation::materialize(&mut tx, &communication, now_millis()).await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn list_recipients(
    state: &AppState,
    id: i64,
) -> ServiceResult<Vec<CommunicationRecipient>> {
    let mut tx = state.store.begin().await?;
    tx.find_communication(id)
        .await?
        .ok_or_else(|| communication_not_found(id))?;
    Ok(tx.list_recipients(id).await?)
}

fn address_for(channel: CommunicationChannel, member: &Member) -> Option<String> {
    match channel {
        CommunicationChannel::Email => Some(member.email.clone()),
        CommunicationChannel::Sms => member.phone.clone().filter(|p| !p.trim().is_empty()),
    }
}

/// One recipient's delivery, decided before any notification goes out
struct Delivery {
    recipient: CommunicationRecipient,
    notification: Option<Notification>,
}

/// Materialise recipients and build their notifications
async fn prepare_send(
    state: &AppState,
    id: i64,
    now: i64,
) -> ServiceResult<(Communication, Vec<Delivery>)> {
    let mut tx = state.store.begin().await?;
    let communication = lock(&mut tx, id).await?;
    if communication.status == CommunicationStatus::Sent {
        return Err(already_sent(id).into());
    }

    segmentation::materialize(&mut tx, &communication, now).await?;
    let recipients = tx.list_recipients(id).await?;
    if recipients.is_empty() {
        return Err(AppError::new(ErrorCode::NoRecipients)
            .with_detail("communication_id", id)
            .into());
    }

    let mut deliveries = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        let member = tx.find_member(recipient.member_id).await?;
        let notification = member.and_then(|member| {
            let to = address_for(communication.channel, &member)?;
            Some(Notification {
                kind: "communication".into(),
                channel: communication.channel,
                member_id: member.id,
                to,
                recipient_name: member.full_name(),
                subject: communication.subject.clone(),
                body: communication.body.clone(),
                context: json!({
                    "communication_id": id,
                    "recipient_id": recipient.id,
                }),
            })
        });
        deliveries.push(Delivery {
            recipient,
            notification,
        });
    }
    tx.commit().await?;
    Ok((communication, deliveries))
}

/// Deliver to every recipient and mark the communication sent.
///
/// Recipients are materialised and committed first, notifications go out
/// with no transaction open, then the outcomes and the sent status are
/// written together. A failed delivery marks that recipient bounced; the
/// send as a whole still succeeds.
pub async fn send(state: &AppState, id: i64) -> ServiceResult<SendReport> {
    let now = now_millis();
    let (communication, deliveries) = prepare_send(state, id, now).await?;

    let mut outcomes = Vec::with_capacity(deliveries.len());
    for Delivery {
        recipient,
        notification,
    } in deliveries
    {
        let delivered = match &notification {
            None => {
                tracing::warn!(
                    communication_id = id,
                    member_id = recipient.member_id,
                    "Recipient has no address for this channel"
                );
                false
            }
            Some(notification) => match state.notifier.send(notification).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(
                        communication_id = id,
                        member_id = recipient.member_id,
                        error = %e,
                        "Delivery failed"
                    );
                    false
                }
            },
        };
        outcomes.push((recipient, delivered));
    }

    let mut tx = state.store.begin().await?;
    let current = lock(&mut tx, id).await?;
    if current.status == CommunicationStatus::Sent {
        tracing::warn!(communication_id = id, "Communication was sent concurrently");
    }

    let mut delivered = 0;
    let mut failed = 0;
    for (mut recipient, ok) in outcomes {
        if ok {
            recipient.delivered = true;
            recipient.delivered_at.get_or_insert(now);
            tx.save_recipient(&recipient).await?;
            tx.insert_activity(
                &NewActivity::new(
                    recipient.member_id,
                    ActivityType::Communication,
                    format!("Received \"{}\"", communication.subject),
                ),
                now,
            )
            .await?;
            delivered += 1;
        } else {
            recipient.bounced = true;
            tx.save_recipient(&recipient).await?;
            failed += 1;
        }
    }

    let communication = tx.mark_communication_sent(id, now).await?;
    tx.commit().await?;

    tracing::info!(communication_id = id, delivered, failed, "Communication sent");
    Ok(SendReport {
        communication,
        delivered,
        failed,
    })
}

/// Record a delivery or engagement event for one recipient.
///
/// Opens and clicks imply delivery; a click implies an open. First
/// timestamps are kept.
pub async fn track(
    state: &AppState,
    id: i64,
    member_id: i64,
    data: RecipientTrack,
) -> ServiceResult<CommunicationRecipient> {
    let now = now_millis();
    let mut tx = state.store.begin().await?;
    let communication = lock(&mut tx, id).await?;
    if communication.status != CommunicationStatus::Sent {
        return Err(AppError::validation(format!("Communication {id} has not been sent"))
            .with_detail("communication_id", id)
            .into());
    }
    let mut recipient = tx.find_recipient(id, member_id).await?.ok_or_else(|| {
        AppError::new(ErrorCode::RecipientNotFound)
            .with_detail("communication_id", id)
            .with_detail("member_id", member_id)
    })?;

    let delivered = |r: &mut CommunicationRecipient| {
        r.delivered = true;
        r.delivered_at.get_or_insert(now);
    };
    match data.event {
        TrackingEvent::Delivered => delivered(&mut recipient),
        TrackingEvent::Open => {
            delivered(&mut recipient);
            recipient.opened = true;
            recipient.opened_at.get_or_insert(now);
        }
        TrackingEvent::Click => {
            delivered(&mut recipient);
            recipient.opened = true;
            recipient.opened_at.get_or_insert(now);
            recipient.clicked = true;
            recipient.clicked_at.get_or_insert(now);
        }
        TrackingEvent::Bounce => recipient.bounced = true,
    }

    tx.save_recipient(&recipient).await?;
    tx.commit().await?;
    Ok(recipient)
}
