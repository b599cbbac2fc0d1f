use rockfall_access::session::SessionManager;
use rockfall_console::config::{build_provider, get_configuration};
use rockfall_console::startup::build_router;
use rockfall_console::AppState;
use rockfall_core::observability::init_tracing;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing("rockfall-console", &configuration.telemetry)?;
    rockfall_console::services::metrics::init_metrics()?;

    let provider = build_provider(&configuration.auth)
        .map_err(|e| anyhow::anyhow!("Failed to build session provider: {}", e))?;
    let session = Arc::new(SessionManager::new(provider));

    let restored = session.start().await;
    info!(
        provider = session.provider_name(),
        authenticated = restored.is_authenticated(),
        "Session initialized"
    );

    let app = build_router(AppState::new(session));

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting rockfall-console on {}", address);
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
