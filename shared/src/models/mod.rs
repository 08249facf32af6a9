//! Data models
//!
//! Shared between guild-server and API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (PostgreSQL BIGSERIAL), timestamps are epoch millis.

pub mod activity;
pub mod automation;
pub mod communication;
pub mod dashboard;
pub mod donation;
pub mod event;
pub mod member;
pub mod segment;
pub mod tier;

// Re-exports
pub use activity::*;
pub use automation::*;
pub use communication::*;
pub use dashboard::*;
pub use donation::*;
pub use event::*;
pub use member::*;
pub use segment::*;
pub use tier::*;
