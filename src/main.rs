// src/main.rs

use dotenvy::dotenv;
use quiz_backend::attempts::spawn_expiry_sweep;
use quiz_backend::config::Config;
use quiz_backend::routes;
use quiz_backend::state::AppState;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    for rejected in &config.rejected_env {
        tracing::warn!("Ignoring environment value: {}", rejected);
    }

    // Open data files and seed the admin account
    let state = AppState::open(config.clone())
        .await
        .expect("Failed to open data directory");
    tracing::info!("Data directory ready: {}", config.data_dir.display());
    tracing::info!(
        "Attempt session timeout: {}ms, sweep every {}s",
        config.session_timeout_ms,
        config.sweep_interval_secs
    );

    let sweep = spawn_expiry_sweep(
        state.attempts.clone(),
        Duration::from_secs(config.sweep_interval_secs),
    );

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listening address");

    // Start the server
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }

    sweep.shutdown().await;
    tracing::info!("Shut down cleanly");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
