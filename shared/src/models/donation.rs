//! Donation Model

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::MemberSummary;

/// How a gift was paid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "donation_method", rename_all = "snake_case")
)]
pub enum DonationMethod {
    Cash,
    Check,
    Card,
    BankTransfer,
    Online,
    #[default]
    Other,
}

/// A single gift, owned by exactly one member
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Donation {
    pub id: i64,
    pub member_id: i64,
    pub amount: Decimal,
    pub processing_fee: Decimal,
    /// `amount - processing_fee`
    pub net_amount: Decimal,
    pub donation_date: NaiveDate,
    pub method: DonationMethod,
    pub designation: Option<String>,
    pub receipt_number: String,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Donation {
    /// Apply an update payload, recomputing `net_amount`
    pub fn apply(&self, update: &DonationUpdate) -> Donation {
        let amount = update.amount.unwrap_or(self.amount);
        let processing_fee = update.processing_fee.unwrap_or(self.processing_fee);
        Donation {
            amount,
            processing_fee,
            net_amount: amount - processing_fee,
            donation_date: update.donation_date.unwrap_or(self.donation_date),
            method: update.method.unwrap_or(self.method),
            designation: update
                .designation
                .clone()
                .or_else(|| self.designation.clone()),
            notes: update.notes.clone().or_else(|| self.notes.clone()),
            ..self.clone()
        }
    }
}

/// Create donation payload
///
/// `member_id` and `amount` are optional at the type level so that missing
/// values surface as validation errors instead of deserialization failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DonationCreate {
    pub member_id: Option<i64>,
    pub amount: Option<Decimal>,
    pub processing_fee: Option<Decimal>,
    pub donation_date: Option<NaiveDate>,
    pub method: Option<DonationMethod>,
    pub designation: Option<String>,
    pub notes: Option<String>,
}

/// Update donation payload (owner is immutable)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DonationUpdate {
    pub amount: Option<Decimal>,
    pub processing_fee: Option<Decimal>,
    pub donation_date: Option<NaiveDate>,
    pub method: Option<DonationMethod>,
    pub designation: Option<String>,
    pub notes: Option<String>,
}

/// Validated insert row
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub member_id: i64,
    pub amount: Decimal,
    pub processing_fee: Decimal,
    pub net_amount: Decimal,
    pub donation_date: NaiveDate,
    pub method: DonationMethod,
    pub designation: Option<String>,
    pub receipt_number: String,
    pub notes: Option<String>,
}

/// Donation joined with its owner's summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationWithMember {
    #[serde(flatten)]
    pub donation: Donation,
    pub member: MemberSummary,
}

/// List filter (`GET /api/donations?member_id=`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DonationQuery {
    pub member_id: Option<i64>,
}
