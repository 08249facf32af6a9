//! Member CRM

use shared::error::{AppError, ErrorCode};
use shared::models::{
    Member, MemberActivity, MemberCreate, MemberQuery, MemberUpdate, TriggerData, TriggerType,
};
use shared::util::now_millis;

use crate::db::RepoError;
use crate::error::{ServiceError, ServiceResult};
use crate::services::automation;
use crate::state::AppState;

pub(crate) fn member_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::MemberNotFound, format!("Member {id} not found"))
        .with_detail("member_id", id)
}

fn email_taken(err: RepoError, email: &str) -> ServiceError {
    match err {
        RepoError::Duplicate(_) => AppError::new(ErrorCode::MemberEmailExists)
            .with_detail("email", email)
            .into(),
        other => other.into(),
    }
}

fn validate_email(email: &str) -> Result<String, AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::required("email"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {
            Ok(email.to_ascii_lowercase())
        }
        _ => Err(AppError::validation(format!("Invalid email address: {email}"))
            .with_detail("field", "email")),
    }
}

fn validate_name(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::required(field));
    }
    Ok(value.to_string())
}

pub async fn list(state: &AppState, query: &MemberQuery) -> ServiceResult<Vec<Member>> {
    let mut tx = state.store.begin().await?;
    Ok(tx.list_members(query).await?)
}

pub async fn get(state: &AppState, id: i64) -> ServiceResult<Member> {
    let mut tx = state.store.begin().await?;
    Ok(tx.find_member(id).await?.ok_or_else(|| member_not_found(id))?)
}

/// Create a member; `member_onboarding` automations fire after commit.
pub async fn create(state: &AppState, mut data: MemberCreate) -> ServiceResult<Member> {
    data.first_name = validate_name("first_name", &data.first_name)?;
    data.last_name = validate_name("last_name", &data.last_name)?;
    data.email = validate_email(&data.email)?;

    let mut tx = state.store.begin().await?;
    let member = tx
        .insert_member(&data, now_millis())
        .await
        .map_err(|e| email_taken(e, &data.email))?;
    tx.commit().await?;

    tracing::info!(member_id = member.id, "Member created");
    automation::fire(state, TriggerType::MemberOnboarding, TriggerData::member(member.id)).await;
    Ok(member)
}

pub async fn update(state: &AppState, id: i64, mut data: MemberUpdate) -> ServiceResult<Member> {
    if let Some(name) = &data.first_name {
        data.first_name = Some(validate_name("first_name", name)?);
    }
    if let Some(name) = &data.last_name {
        data.last_name = Some(validate_name("last_name", name)?);
    }
    if let Some(email) = &data.email {
        data.email = Some(validate_email(email)?);
    }

    let mut tx = state.store.begin().await?;
    let member = tx
        .update_member(id, &data, now_millis())
        .await
        .map_err(|e| email_taken(e, data.email.as_deref().unwrap_or_default()))?
        .ok_or_else(|| member_not_found(id))?;
    tx.commit().await?;
    Ok(member)
}

/// Soft delete: the member is deactivated so donations and history stay intact.
pub async fn deactivate(state: &AppState, id: i64) -> ServiceResult<Member> {
    let now = now_millis();
    let mut tx = state.store.begin().await?;
    if !tx.deactivate_member(id, now).await? {
        return Err(member_not_found(id).into());
    }
    let member = tx
        .find_member(id)
        .await?
        .ok_or_else(|| member_not_found(id))?;
    tx.commit().await?;

    tracing::info!(member_id = id, "Member deactivated");
    Ok(member)
}

pub async fn activities(state: &AppState, id: i64) -> ServiceResult<Vec<MemberActivity>> {
    let mut tx = state.store.begin().await?;
    tx.find_member(id)
        .await?
        .ok_or_else(|| member_not_found(id))?;
    Ok(tx.list_activities(id).await?)
}
