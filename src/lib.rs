pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod state;
pub mod background;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::api::router::create_router;
use crate::background::start_reminder_ticker;
use crate::config::Config;
use crate::infra::factory::{bootstrap_state, storage_backend};

const LOG_DIR: &str = "./logs";

/// Stdout follows `RUST_LOG`; the daily JSON file always keeps this crate's debug events.
pub fn init_logging() -> WorkerGuard {
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(LOG_DIR, "studio-booking.log"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(file_writer)
                .with_filter(EnvFilter::new("info,studio_booking=debug,sqlx=warn")),
        )
        .init();

    guard
}

pub async fn run() {
    let _guard = init_logging();
    let config = Config::from_env();
    let state = Arc::new(bootstrap_state(&config).await);

    let backend = storage_backend(config.database_url.as_deref(), state.degraded);
    let channels: Vec<&str> = state.dispatcher.registered_channels().iter().map(|k| k.as_str()).collect();
    info!(backend = backend, channels = ?channels, default_channel = %config.default_channel, timezone = %config.studio_timezone, "Studio booking service configured");
    if state.degraded {
        warn!("Serving placeholder data; reservations made now are NOT persisted");
    }

    tokio::spawn(start_reminder_ticker(state.clone()));

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await {
        Ok(listener) => listener,
        Err(e) => panic!("Failed to bind port {}: {}", config.port, e),
    };
    info!("Listening on port {}", config.port);
    if let Err(e) = axum::serve(listener, create_router(state)).await {
        panic!("Server error: {}", e);
    }
}
