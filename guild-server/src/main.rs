use guild_server::services::seed;
use guild_server::utils::init_logger_with_file;
use guild_server::{AppState, BoxError, Config, api};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    // Held for the process lifetime so buffered file logs are flushed
    let _log_guard = init_logger_with_file(
        config.log_level.as_deref(),
        config.log_json,
        config.log_dir.as_deref(),
    );

    tracing::info!("Starting guild-server (env: {})", config.environment);

    let state = AppState::from_config(&config).await?;

    if config.seed_demo_data {
        if config.is_production() {
            tracing::warn!("SEED_DEMO_DATA is ignored in production");
        } else if let Err(e) = seed::run(&state).await {
            let err: shared::AppError = e.into();
            tracing::error!(code = %err.code, "Demo seed failed: {}", err.message);
        }
    }

    let app = api::build_app(state);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("guild-server HTTP listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("guild-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
