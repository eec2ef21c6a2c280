use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use study_server::config::AppConfig;
use study_server::database::init_db;
use study_server::gateway::HttpExtractionGateway;
use study_server::ledger::DbLedger;
use study_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;

    info!("Connecting to database...");
    let db = init_db(&config.database).await?;

    let gateway = HttpExtractionGateway::new(&config.gateway)?;
    info!(base_url = %config.gateway.base_url, "Extraction service configured");

    let state = AppState {
        ledger: Arc::new(DbLedger::new(db.clone())),
        gateway: Arc::new(gateway),
        db,
        config: config.clone(),
    };

    let app = study_server::build_router(state);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on http://{address}");
    info!("Swagger UI: http://{address}/swagger-ui");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}
