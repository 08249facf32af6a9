//! Recipient segmentation
//!
//! Turns a communication's segment names into member ids and writes the
//! recipient rows. Rows are written once per communication; later calls are
//! no-ops.

use shared::error::{AppError, ErrorCode};
use shared::models::{Communication, RecipientMaterialization, SegmentError, SegmentFilter};
use shared::util::today;

use crate::db::StoreTx;
use crate::error::ServiceResult;

pub fn parse(segments: &[String]) -> Result<SegmentFilter, AppError> {
    SegmentFilter::parse(segments, today()).map_err(|e| match e {
        SegmentError::Empty => AppError::with_message(ErrorCode::ValidationFailed, e.to_string())
            .with_detail("field", "recipient_segments"),
        SegmentError::Unknown(ref name) => {
            AppError::with_message(ErrorCode::UnknownSegment, e.to_string())
                .with_detail("segment", name.clone())
        }
    })
}

/// Sorted, de-duplicated ids of the members selected by `segments`
pub async fn resolve(tx: &mut Box<dyn StoreTx>, segments: &[String]) -> ServiceResult<Vec<i64>> {
    let filter = parse(segments)?;
    let mut ids = tx.segment_member_ids(&filter).await?;
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

/// Write recipient rows for `communication` unless some already exist
pub async fn materialize(
    tx: &mut Box<dyn StoreTx>,
    communication: &Communication,
    now: i64,
) -> ServiceResult<RecipientMaterialization> {
    let existing = tx.count_recipients(communication.id).await?;
    if existing > 0 {
        return Ok(RecipientMaterialization {
            communication_id: communication.id,
            created: 0,
            total_recipients: communication.total_recipients,
        });
    }

    let ids = resolve(tx, &communication.recipient_segments).await?;
    let created = tx.insert_recipients(communication.id, &ids).await?;
    let total = i32::try_from(created)
        .map_err(|_| AppError::internal("Recipient count does not fit in i32"))?;
    tx.set_total_recipients(communication.id, total, now).await?;

    tracing::info!(
        communication_id = communication.id,
        recipients = created,
        "Recipients materialized"
    );
    Ok(RecipientMaterialization {
        communication_id: communication.id,
        created,
        total_recipients: total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{add_member, member_create, test_state};
    use crate::services::{donation, member};
    use rust_decimal::Decimal;
    use shared::models::{DonationCreate, MemberUpdate};

    fn segs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse(&[]).unwrap_err().code, ErrorCode::ValidationFailed);
        let err = parse(&segs(&["vip"])).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownSegment);
        assert_eq!(err.http_status(), http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_resolve_union_and_subscription() {
        let (state, _) = test_state();
        let gold = add_member(&state, "gold@example.org").await;
        donation::create(
            &state,
            DonationCreate {
                member_id: Some(gold.id),
                amount: Some(Decimal::from(6000)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let mut reader = member_create("reader@example.org");
        reader.newsletter_subscribed = true;
        let reader = member::create(&state, reader).await.unwrap();

        let muted = add_member(&state, "muted@example.org").await;
        member::update(
            &state,
            muted.id,
            MemberUpdate {
                email_subscribed: Some(false),
                newsletter_subscribed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let plain = add_member(&state, "plain@example.org").await;

        let mut tx = state.store.begin().await.unwrap();
        let ids = resolve(&mut tx, &segs(&["gold", "newsletter_subscribers"]))
            .await
            .unwrap();
        assert_eq!(ids, vec![gold.id, reader.id]);

        let everyone = resolve(&mut tx, &segs(&["all", "platinum"])).await.unwrap();
        assert_eq!(everyone, vec![gold.id, reader.id, plain.id]);

        let recent = resolve(&mut tx, &segs(&["recent_donors"])).await.unwrap();
        assert_eq!(recent, vec![gold.id]);
    }
}
