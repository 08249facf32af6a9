//! Shared types for the Guild Ledger service
//!
//! Domain models, the tier calculator, segment rules and the unified
//! error/response types used by `guild-server` and by API clients.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::Tier;
