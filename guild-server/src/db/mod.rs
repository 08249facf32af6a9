//! Record store
//!
//! Every request works through a [`StoreTx`] obtained from [`Store::begin`].
//! A transaction is committed explicitly; dropping it rolls back.
//!
//! Two backends implement the same traits:
//! - [`postgres::PgStore`] (sqlx, row locks via `SELECT ... FOR UPDATE`)
//! - [`memory::MemoryStore`] (whole-store mutex, used by tests and demos)

pub mod memory;
pub mod postgres;
pub mod repository;

use async_trait::async_trait;
use thiserror::Error;

pub use repository::{
    ActivityRepository, AutomationRepository, CommunicationRepository, DonationRepository,
    EventRepository, MemberRepository, RegistrationRepository, ReportRepository,
};

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// One unit of work across every repository
#[async_trait]
pub trait StoreTx:
    MemberRepository
    + DonationRepository
    + EventRepository
    + RegistrationRepository
    + CommunicationRepository
    + AutomationRepository
    + ActivityRepository
    + ReportRepository
    + Send
{
    async fn commit(self: Box<Self>) -> RepoResult<()>;
}

/// Transaction factory injected into the application state
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> RepoResult<Box<dyn StoreTx>>;
}
