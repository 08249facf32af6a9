//! Application state for guild-server

use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::db::postgres::PgStore;
use crate::error::BoxError;
use crate::services::notifier::{LogNotifier, Notifier, WebhookNotifier};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Record store (PostgreSQL in production, in-memory in tests)
    pub store: Arc<dyn Store>,
    /// Outbound notification channel
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Connect to PostgreSQL, run migrations and pick the notifier
    pub async fn from_config(config: &Config) -> Result<Self, BoxError> {
        let store = PgStore::connect(&config.database_url, config.database_max_connections).await?;
        tracing::info!("Database ready");

        let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
            Some(url) => {
                tracing::info!(url = %url, "Using webhook notifier");
                Arc::new(WebhookNotifier::new(url.clone())?)
            }
            None => {
                tracing::info!("NOTIFY_WEBHOOK_URL not set, notifications are logged only");
                Arc::new(LogNotifier)
            }
        };

        Ok(Self::new(Arc::new(store), notifier))
    }
}
