use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use warehouse_queue::api;
use warehouse_queue::config::Config;
use warehouse_queue::error::AppError;
use warehouse_queue::identity::line::LineIdentityProvider;
use warehouse_queue::identity::memory::StaticIdentityProvider;
use warehouse_queue::identity::{IdentityBackend, IdentityProvider};
use warehouse_queue::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let identity: Arc<dyn IdentityProvider> = match config.identity_backend {
        IdentityBackend::Line => Arc::new(LineIdentityProvider::new(config.line_channel_id.clone())),
        IdentityBackend::Static => Arc::new(StaticIdentityProvider::new()),
    };

    let shared_state = Arc::new(AppState::new(&config, identity)?);
    let app = api::rest::router(shared_state);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
