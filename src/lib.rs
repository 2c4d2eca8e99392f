pub mod api;
pub mod associations;
pub mod config;
pub mod core_state;
pub mod db;
pub mod enrollment;
pub mod error;
pub mod intake;
pub mod models;
pub mod pricing;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Start the intake service and block until Ctrl-C.
pub async fn run() -> Result<(), String> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::IntakeConfig::from_env().map_err(|e| e.to_string())?;
    tracing::info!(
        db_path = %config.db_path.display(),
        bind_addr = %config.bind_addr,
        "Configuration loaded"
    );

    let bind_addr = config.bind_addr;
    let core = Arc::new(core_state::CoreState::new(config));

    // Create the schema before accepting requests
    core.open_db().map_err(|e| e.to_string())?;

    let mut server = api::start_api_server(core, bind_addr).await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for shutdown signal: {e}"))?;

    server.shutdown();
    server.wait().await;
    Ok(())
}
