// File: services/clinic_backend/src/main.rs
use clinic_backend::{build_router, AppState};
use clinic_common::{config_error, ClinicError, Context};
use clinic_config::load_config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ClinicError> {
    let config = Arc::new(
        load_config().map_err(|e| config_error(format!("Failed to load config: {e}")))?,
    );
    // Keeps the file writer flushing until main returns.
    let _log_guard = clinic_common::init_with_config(&config.logging);

    let state = AppState::new(config.clone()).await?;
    let app = build_router(&state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
