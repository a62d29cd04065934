//! waymark server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ security (maintenance, rate limit)
//!                                          │
//!                                          ▼
//!                                  dispatch::Dispatcher
//!                                          │
//!                      ┌───────────────────┼───────────────────┐
//!                      ▼                   ▼                   ▼
//!               routing (match)    security (access)    render (output)
//!                                          │
//!     Client Response                      ▼
//!     ◀────────────── http::response ◀── Response
//! ```
//!
//! Configuration comes from the file named by `WAYMARK_CONFIG`; defaults
//! apply when it is unset. The file is watched and reloaded on change.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use waymark::config::{load_config, AppConfig, ConfigWatcher};
use waymark::controller::ControllerSet;
use waymark::http::HttpServer;
use waymark::lifecycle::{build_dispatcher, Shutdown};
use waymark::observability::{logging, metrics};

const CONFIG_ENV: &str = "WAYMARK_CONFIG";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init(Some(&config.observability.log_level));
    tracing::info!("waymark v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = ?config.environment.name,
        request_timeout_secs = config.timeouts.request_secs,
        config = ?config_path,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let dispatcher = Arc::new(build_dispatcher(&config, ControllerSet::builder())?);

    // Keep the watcher alive for the life of the server.
    let (_watcher, config_updates) = match &config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, &config);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config, dispatcher);
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
