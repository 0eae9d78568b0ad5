use release_hook_relay::{AppState, RelayConfig, api, logging};
use std::sync::Arc;
use tracing::{self, info};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let config = match RelayConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    // Keep the guard alive so the file writer flushes on exit
    let _log_guard = match logging::setup_logging(config.log_dir.clone()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let bind_address = config.bind_address.clone();
    info!(
        authorization = config.authorization.is_some(),
        signature = config.webhook_secret.is_some(),
        forwarding = config.http_endpoint.is_some(),
        profile = ?config.profile,
        encoding = ?config.encoding,
        head_length = config.head_length,
        "Relay configured"
    );

    let state = match AppState::new(config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let app = api::router(state);

    info!("Listening on {}", bind_address);
    let listener = match tokio::net::TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", bind_address, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
