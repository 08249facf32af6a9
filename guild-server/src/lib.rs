//! guild-server: back office for a charity guild
//!
//! - Member CRM with lifetime giving and tiers
//! - Donations that keep member totals and tiers in sync
//! - Events with capacity, waitlist and FIFO promotion
//! - Bulk communications with recipient segments and tracking
//! - Automations fired by domain events or manually

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod state;
pub mod utils;

pub use config::Config;
pub use error::{BoxError, ServiceError, ServiceResult};
pub use state::AppState;
