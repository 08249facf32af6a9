//! Server configuration

use crate::error::BoxError;

/// Server configuration, loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Connection pool size
    pub database_max_connections: u32,
    /// Webhook receiving notifications; log-only when unset
    pub notify_webhook_url: Option<String>,
    /// Insert demo data on startup when the database is empty
    pub seed_demo_data: bool,
    /// Log filter directive (falls back to RUST_LOG, then the default)
    pub log_level: Option<String>,
    /// JSON log lines
    pub log_json: bool,
    /// Directory for daily rolling log files
    pub log_dir: Option<String>,
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment,
            database_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(10),
            notify_webhook_url: env_non_empty("NOTIFY_WEBHOOK_URL"),
            seed_demo_data: env_flag("SEED_DEMO_DATA"),
            log_level: env_non_empty("LOG_LEVEL"),
            log_json: env_flag("LOG_JSON"),
            log_dir: env_non_empty("LOG_DIR"),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
