//! Donation mutations
//!
//! Every create/update/delete keeps the owning member's `total_donated` and
//! `tier` in step with the donations table, inside one transaction:
//!
//! ```text
//! lock member -> write donation -> total' = max(0, total + delta)
//!             -> tier' = Tier::from_total(total') -> write member -> activity
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    ActivityType, Donation, DonationCreate, DonationQuery, DonationUpdate, DonationWithMember,
    Member, NewActivity, NewDonation, Tier, TriggerData, TriggerType,
};
use shared::util::{now_millis, receipt_number, today};

use crate::db::{RepoError, StoreTx};
use crate::error::ServiceResult;
use crate::services::automation;
use crate::state::AppState;

fn money(value: Decimal) -> String {
    format!("${:.2}", value)
}

fn donation_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::DonationNotFound, format!("Donation {id} not found"))
        .with_detail("donation_id", id)
}

/// Amounts are stored to the cent; one that rounds to zero is rejected
fn validate_amount(amount: Decimal) -> Result<Decimal, AppError> {
    let amount = amount.round_dp(2);
    if amount <= Decimal::ZERO {
        return Err(AppError::new(ErrorCode::InvalidAmount).with_detail("field", "amount"));
    }
    Ok(amount)
}

fn validate_fee(fee: Decimal, amount: Decimal) -> Result<Decimal, AppError> {
    if fee < Decimal::ZERO || fee > amount {
        return Err(AppError::with_message(
            ErrorCode::InvalidProcessingFee,
            "Processing fee must be between zero and the donation amount",
        )
        .with_detail("field", "processing_fee"));
    }
    Ok(fee.round_dp(2))
}

/// Result of moving a member's lifetime total
struct GivingChange {
    previous_tier: Tier,
    tier: Tier,
}

impl GivingChange {
    fn upgraded(&self) -> bool {
        self.tier.rank() > self.previous_tier.rank()
    }
}

/// Apply `delta` to the locked member's total, recompute the tier and log
/// the tier change when there is one.
async fn apply_giving_delta(
    tx: &mut Box<dyn StoreTx>,
    member: &Member,
    delta: Decimal,
    last_donation_date: Option<NaiveDate>,
    now: i64,
) -> ServiceResult<GivingChange> {
    let total = (member.total_donated + delta).max(Decimal::ZERO);
    let tier = Tier::from_total(total);

    tx.update_member_giving(member.id, total, tier, last_donation_date, now)
        .await?;

    if tier != member.tier {
        tx.insert_activity(
            &NewActivity::new(
                member.id,
                ActivityType::TierChange,
                format!("Tier changed from {} to {}", member.tier, tier),
            ),
            now,
        )
        .await?;
        tracing::info!(
            member_id = member.id,
            from = %member.tier,
            to = %tier,
            "Member tier changed"
        );
    }

    Ok(GivingChange {
        previous_tier: member.tier,
        tier,
    })
}

pub async fn list(state: &AppState, query: &DonationQuery) -> ServiceResult<Vec<Donation>> {
    let mut tx = state.store.begin().await?;
    Ok(tx.list_donations(query).await?)
}

pub async fn get(state: &AppState, id: i64) -> ServiceResult<DonationWithMember> {
    let mut tx = state.store.begin().await?;
    let donation = tx
        .find_donation(id)
        .await?
        .ok_or_else(|| donation_not_found(id))?;
    let member = tx.find_member(donation.member_id).await?.ok_or_else(|| {
        AppError::with_message(
            ErrorCode::MemberNotFound,
            format!("Member {} not found", donation.member_id),
        )
    })?;
    Ok(DonationWithMember {
        donation,
        member: member.summary(),
    })
}

/// Record a gift and credit it to the member.
///
/// Automations for `donation_acknowledgment` (and `tier_upgrade` when the
/// rank rose) fire after commit; their failures are logged, not returned.
pub async fn create(state: &AppState, data: DonationCreate) -> ServiceResult<DonationWithMember> {
    let member_id = data.member_id.ok_or_else(|| AppError::required("member_id"))?;
    let amount = validate_amount(data.amount.ok_or_else(|| AppError::required("amount"))?)?;
    let processing_fee = validate_fee(data.processing_fee.unwrap_or(Decimal::ZERO), amount)?;
    let donation_date = data.donation_date.unwrap_or_else(today);

    let new_donation = NewDonation {
        member_id,
        amount,
        processing_fee,
        net_amount: amount - processing_fee,
        donation_date,
        method: data.method.unwrap_or_default(),
        designation: data.designation,
        receipt_number: receipt_number(donation_date),
        notes: data.notes,
    };

    let now = now_millis();
    let mut tx = state.store.begin().await?;

    let member = tx.lock_member(member_id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::MemberNotFound, format!("Member {member_id} not found"))
            .with_detail("member_id", member_id)
    })?;

    let donation = tx
        .insert_donation(&new_donation, now)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => AppError::new(ErrorCode::ReceiptNumberExists).into(),
            other => crate::error::ServiceError::from(other),
        })?;

    let last_donation_date = Some(
        member
            .last_donation_date
            .map_or(donation_date, |d| d.max(donation_date)),
    );
    let change = apply_giving_delta(&mut tx, &member, amount, last_donation_date, now).await?;

    tx.insert_activity(
        &NewActivity::new(
            member.id,
            ActivityType::Donation,
            format!("Donated {} ({})", money(amount), donation.receipt_number),
        )
        .with_value(amount),
        now,
    )
    .await?;

    let member = tx
        .find_member(member.id)
        .await?
        .ok_or_else(|| AppError::internal("Member vanished inside transaction"))?;
    tx.commit().await?;

    tracing::info!(
        donation_id = donation.id,
        member_id = member.id,
        amount = %amount,
        tier = %member.tier,
        "Donation recorded"
    );

    let trigger_data = TriggerData {
        member_id: Some(member.id),
        donation_id: Some(donation.id),
        ..Default::default()
    };
    automation::fire(state, TriggerType::DonationAcknowledgment, trigger_data).await;
    if change.upgraded() {
        automation::fire(state, TriggerType::TierUpgrade, TriggerData::member(member.id)).await;
    }

    Ok(DonationWithMember {
        donation,
        member: member.summary(),
    })
}

/// Update a gift; the member total moves by `new - old` when the amount changed
pub async fn update(state: &AppState, id: i64, data: DonationUpdate) -> ServiceResult<Donation> {
    let now = now_millis();
    let mut tx = state.store.begin().await?;

    let existing = tx
        .lock_donation(id)
        .await?
        .ok_or_else(|| donation_not_found(id))?;

    let mut updated = existing.apply(&data);
    updated.amount = validate_amount(updated.amount)?;
    updated.processing_fee = validate_fee(updated.processing_fee, updated.amount)?;
    updated.net_amount = updated.amount - updated.processing_fee;
    updated.updated_at = now;

    let saved = tx.save_donation(&updated).await?;

    let mut upgraded_member = None;
    if saved.amount != existing.amount {
        let delta = saved.amount - existing.amount;
        match tx.lock_member(existing.member_id).await? {
            Some(member) => {
                let change =
                    apply_giving_delta(&mut tx, &member, delta, member.last_donation_date, now)
                        .await?;
                tx.insert_activity(
                    &NewActivity::new(
                        member.id,
                        ActivityType::Donation,
                        format!(
                            "Donation {} changed from {} to {}",
                            saved.receipt_number,
                            money(existing.amount),
                            money(saved.amount)
                        ),
                    )
                    .with_value(delta),
                    now,
                )
                .await?;
                if change.upgraded() {
                    upgraded_member = Some(member.id);
                }
            }
            None => {
                tracing::warn!(
                    donation_id = id,
                    member_id = existing.member_id,
                    "Owning member missing, skipping total recompute"
                );
            }
        }
    }

    tx.commit().await?;
    tracing::info!(donation_id = id, amount = %saved.amount, "Donation updated");

    if let Some(member_id) = upgraded_member {
        automation::fire(state, TriggerType::TierUpgrade, TriggerData::member(member_id)).await;
    }

    Ok(saved)
}

/// Delete a gift and take it back out of the member's total (never below zero)
pub async fn delete(state: &AppState, id: i64) -> ServiceResult<Donation> {
    let now = now_millis();
    let mut tx = state.store.begin().await?;

    let existing = tx
        .lock_donation(id)
        .await?
        .ok_or_else(|| donation_not_found(id))?;

    if !tx.delete_donation(id).await? {
        return Err(donation_not_found(id).into());
    }

    match tx.lock_member(existing.member_id).await? {
        Some(member) => {
            apply_giving_delta(
                &mut tx,
                &member,
                -existing.amount,
                member.last_donation_date,
                now,
            )
            .await?;
            tx.insert_activity(
                &NewActivity::new(
                    member.id,
                    ActivityType::Donation,
                    format!(
                        "Donation {} of {} removed",
                        existing.receipt_number,
                        money(existing.amount)
                    ),
                )
                .with_value(-existing.amount),
                now,
            )
            .await?;
        }
        None => {
            tracing::warn!(
                donation_id = id,
                member_id = existing.member_id,
                "Owning member missing, skipping total recompute"
            );
        }
    }

    tx.commit().await?;
    tracing::info!(donation_id = id, "Donation deleted");
    Ok(existing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{add_member, giving, test_state};
    use rust_decimal::Decimal;

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    fn gift(member_id: i64, amount: i64) -> DonationCreate {
        DonationCreate {
            member_id: Some(member_id),
            amount: Some(dec(amount)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_credits_member_and_logs_activity() {
        let (state, _) = test_state();
        let member = add_member(&state, "ada@example.org").await;

        let created = create(&state, gift(member.id, 300)).await.unwrap();
        assert_eq!(created.donation.net_amount, dec(300));
        assert!(created.donation.receipt_number.starts_with("RCP-"));
        assert_eq!(created.member.total_donated, dec(300));
        assert_eq!(created.member.tier, Tier::Bronze);

        let (total, tier, activities) = giving(&state, member.id).await;
        assert_eq!(total, dec(300));
        assert_eq!(tier, Tier::Bronze);
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].activity_type, ActivityType::Donation);
        assert_eq!(activities[0].activity_value, Some(dec(300)));
    }

    #[tokio::test]
    async fn test_silver_to_gold_scenario() {
        let (state, _) = test_state();
        let member = add_member(&state, "ada@example.org").await;
        create(&state, gift(member.id, 4950)).await.unwrap();
        let (_, tier, _) = giving(&state, member.id).await;
        assert_eq!(tier, Tier::Silver);

        let created = create(&state, gift(member.id, 100)).await.unwrap();
        assert_eq!(created.member.total_donated, dec(5050));
        assert_eq!(created.member.tier, Tier::Gold);

        let (_, _, activities) = giving(&state, member.id).await;
        // newest first: donation, tier change, then the first gift's rows
        assert_eq!(activities[0].activity_type, ActivityType::Donation);
        assert_eq!(activities[0].activity_value, Some(dec(100)));
        assert_eq!(activities[1].activity_type, ActivityType::TierChange);
        assert_eq!(activities[1].description, "Tier changed from silver to gold");
        let donation_rows = activities
            .iter()
            .filter(|a| a.activity_type == ActivityType::Donation)
            .count();
        assert_eq!(donation_rows, 2);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let (state, _) = test_state();
        let member = add_member(&state, "ada@example.org").await;

        let err: AppError = create(&state, DonationCreate::default()).await.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::RequiredField);

        let err: AppError = create(&state, gift(member.id, 0)).await.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::InvalidAmount);

        let mut too_much_fee = gift(member.id, 10);
        too_much_fee.processing_fee = Some(dec(11));
        let err: AppError = create(&state, too_much_fee).await.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::InvalidProcessingFee);

        let err: AppError = create(&state, gift(999, 10)).await.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::MemberNotFound);

        // nothing was written by the failed attempts
        assert!(list(&state, &DonationQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sub_cent_amount_rejected() {
        let (state, _) = test_state();
        let member = add_member(&state, "ada@example.org").await;

        let mut data = gift(member.id, 0);
        data.amount = Some(Decimal::new(4, 3));
        let err: AppError = create(&state, data).await.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::InvalidAmount);

        let (total, _, activities) = giving(&state, member.id).await;
        assert_eq!(total, Decimal::ZERO);
        assert!(activities.is_empty());

        let created = create(&state, gift(member.id, 20)).await.unwrap();
        let err: AppError = update(
            &state,
            created.donation.id,
            DonationUpdate {
                amount: Some(Decimal::new(4, 3)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err()
        .into();
        assert_eq!(err.code, ErrorCode::InvalidAmount);
        let (total, _, _) = giving(&state, member.id).await;
        assert_eq!(total, dec(20));
    }

    #[tokio::test]
    async fn test_orphaned_donation_update_and_delete() {
        let (state, _) = test_state();
        let member = add_member(&state, "ada@example.org").await;

        // a donation whose owning member row no longer exists
        let mut tx = state.store.begin().await.unwrap();
        let orphan = tx
            .insert_donation(
                &NewDonation {
                    member_id: 999,
                    amount: dec(40),
                    processing_fee: Decimal::ZERO,
                    net_amount: dec(40),
                    donation_date: today(),
                    method: Default::default(),
                    designation: None,
                    receipt_number: "RCP-20250101-ORPHAN".into(),
                    notes: None,
                },
                1,
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let updated = update(
            &state,
            orphan.id,
            DonationUpdate {
                amount: Some(dec(60)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.amount, dec(60));
        assert_eq!(updated.net_amount, dec(60));

        let removed = delete(&state, orphan.id).await.unwrap();
        assert_eq!(removed.amount, dec(60));
        let err: AppError = get(&state, orphan.id).await.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::DonationNotFound);

        // unrelated members are untouched
        let (total, _, activities) = giving(&state, member.id).await;
        assert_eq!(total, Decimal::ZERO);
        assert!(activities.is_empty());
    }

    #[tokio::test]
    async fn test_net_amount_subtracts_fee() {
        let (state, _) = test_state();
        let member = add_member(&state, "ada@example.org").await;
        let mut data = gift(member.id, 100);
        data.processing_fee = Some(Decimal::new(320, 2));
        let created = create(&state, data).await.unwrap();
        assert_eq!(created.donation.net_amount, Decimal::new(9680, 2));
        // the member is credited with the gross amount
        assert_eq!(created.member.total_donated, dec(100));
    }

    #[tokio::test]
    async fn test_update_amount_moves_total_by_delta() {
        let (state, _) = test_state();
        let member = add_member(&state, "ada@example.org").await;
        create(&state, gift(member.id, 900)).await.unwrap();
        let second = create(&state, gift(member.id, 50)).await.unwrap();

        let updated = update(
            &state,
            second.donation.id,
            DonationUpdate {
                amount: Some(dec(150)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.amount, dec(150));

        let (total, tier, activities) = giving(&state, member.id).await;
        assert_eq!(total, dec(1050));
        assert_eq!(tier, Tier::Silver);
        assert_eq!(activities[0].activity_value, Some(dec(100)));
    }

    #[tokio::test]
    async fn test_update_other_fields_leaves_member_untouched() {
        let (state, _) = test_state();
        let member = add_member(&state, "ada@example.org").await;
        let created = create(&state, gift(member.id, 200)).await.unwrap();
        let (_, _, before) = giving(&state, member.id).await;

        update(
            &state,
            created.donation.id,
            DonationUpdate {
                designation: Some("scholarships".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let (total, _, after) = giving(&state, member.id).await;
        assert_eq!(total, dec(200));
        assert_eq!(before.len(), after.len());
    }

    #[tokio::test]
    async fn test_update_missing_donation() {
        let (state, _) = test_state();
        let err: AppError = update(&state, 42, DonationUpdate::default())
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::DonationNotFound);
        assert_eq!(err.http_status(), http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_is_inverse_of_create() {
        let (state, _) = test_state();
        let member = add_member(&state, "ada@example.org").await;
        create(&state, gift(member.id, 4000)).await.unwrap();
        let second = create(&state, gift(member.id, 1500)).await.unwrap();
        assert_eq!(second.member.tier, Tier::Gold);

        delete(&state, second.donation.id).await.unwrap();
        let (total, tier, activities) = giving(&state, member.id).await;
        assert_eq!(total, dec(4000));
        assert_eq!(tier, Tier::Silver);
        assert_eq!(activities[0].activity_value, Some(dec(-1500)));
        assert_eq!(activities[1].activity_type, ActivityType::TierChange);
    }

    #[tokio::test]
    async fn test_double_delete_is_not_found_and_total_never_negative() {
        let (state, _) = test_state();
        let member = add_member(&state, "ada@example.org").await;
        let created = create(&state, gift(member.id, 75)).await.unwrap();

        delete(&state, created.donation.id).await.unwrap();
        let err: AppError = delete(&state, created.donation.id)
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::DonationNotFound);

        let (total, tier, _) = giving(&state, member.id).await;
        assert_eq!(total, Decimal::ZERO);
        assert_eq!(tier, Tier::Bronze);
    }

    #[tokio::test]
    async fn test_last_donation_date_keeps_latest() {
        let (state, _) = test_state();
        let member = add_member(&state, "ada@example.org").await;
        let late = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let early = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        let mut first = gift(member.id, 10);
        first.donation_date = Some(late);
        create(&state, first).await.unwrap();
        let mut second = gift(member.id, 10);
        second.donation_date = Some(early);
        create(&state, second).await.unwrap();

        let mut tx = state.store.begin().await.unwrap();
        let member = tx.find_member(member.id).await.unwrap().unwrap();
        assert_eq!(member.last_donation_date, Some(late));
    }
}
