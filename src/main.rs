//! zybot - Minecraft chat command bot.
//!
//! Usage: `zybot [config-dir]` (defaults to `config`).

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};
use zybot::config::{Config, validate};
use zybot::http::StatusServer;
use zybot::telemetry::DailyLogFile;
use zybot::transport::BridgeConnector;
use zybot::{PluginHost, builtins};

/// Daily log files go here unless `ZYBOT_LOG_DIR` says otherwise.
const LOG_DIR: &str = "logs";

/// How long the status server gets to close its connections.
const SHUTDOWN_DRAIN: Duration = Duration::from_secs(5);
/// Grace period for queued bridge ops (farewell, quit) to flush.
const FLUSH_DELAY: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config".to_string());
    let config = Config::load_or_default(&config_dir);

    if let Err(errors) = validate(&config) {
        for e in &errors {
            warn!(error = %e, "Configuration problem");
        }
    }

    info!(
        config_dir = %config_dir,
        server = %config.server_label(),
        bridge = %config.bridge.address,
        "Starting zybot"
    );

    let connector = Arc::new(
        BridgeConnector::new(config.bridge.address.clone())
            .with_connect_timeout(config.bridge.connect_timeout()),
    );
    let web = config.web.clone();
    let host = PluginHost::new(config, connector, builtins::catalog());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let web_task = if web.enabled {
        let server = StatusServer::bind(&web, host.bot().clone())
            .await
            .map_err(|e| {
                error!(address = %web.address, error = %e, "Failed to bind status server");
                e
            })?;
        Some(tokio::spawn(server.serve(shutdown_rx)))
    } else {
        info!("Status server disabled");
        None
    };

    let summary = host.start().await;
    info!(
        loaded = summary.loaded.len(),
        failed = summary.failed.len(),
        "Plugins ready"
    );

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received");

    host.shutdown();
    let _ = shutdown_tx.send(true);

    if let Some(task) = web_task {
        match tokio::time::timeout(SHUTDOWN_DRAIN, task).await {
            Ok(Ok(Ok(()))) => info!("Status server stopped"),
            Ok(Ok(Err(e))) => error!(error = %e, "Status server failed"),
            Ok(Err(e)) => error!(error = %e, "Status server task panicked"),
            Err(_) => warn!("Status server did not stop in time"),
        }
    }
    tokio::time::sleep(FLUSH_DELAY).await;

    info!("Goodbye");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout = if std::env::var_os("ZYBOT_LOG_JSON").is_some() {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    };

    let log_dir = std::env::var("ZYBOT_LOG_DIR").unwrap_or_else(|_| LOG_DIR.to_string());
    let (file, file_error) = match DailyLogFile::new(&log_dir) {
        Ok(files) => (
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(files),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(file)
        .init();

    if let Some(e) = file_error {
        warn!(dir = %log_dir, error = %e, "File logging disabled");
    }
}
