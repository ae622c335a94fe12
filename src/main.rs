mod api;
mod config;
mod engine;
mod error;
mod models;
mod observability;
mod state;
mod transport;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::transport::{MessageSender, TraceSender, WebhookSender};

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let (app_state, dispatch_rx, inbound_rx) =
        state::AppState::new(config.dispatch_queue_size, config.inbound_queue_size);
    let shared_state = Arc::new(app_state);

    let sender: Arc<dyn MessageSender> = match config.outbound_webhook_url.clone() {
        Some(url) => Arc::new(WebhookSender::new(url)?),
        None => {
            tracing::warn!("OUTBOUND_WEBHOOK_URL not set; outbound messages will only be logged");
            Arc::new(TraceSender)
        }
    };

    let app = api::rest::router(shared_state.clone());

    tokio::spawn(engine::router::run_message_engine(
        shared_state.clone(),
        sender.clone(),
        inbound_rx,
    ));
    tokio::spawn(engine::dispatch::run_dispatch_engine(
        shared_state.clone(),
        sender.clone(),
        dispatch_rx,
    ));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
