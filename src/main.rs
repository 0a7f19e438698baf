//! Warbler catalogue server.
//!
//! Reads its configuration from the environment, installs logging and serves
//! until interrupted.

use anyhow::Context;
use core_runtime::config::ServerConfig;
use core_runtime::logging::{init_logging, strip_path};
use core_service::CatalogService;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("invalid configuration")?;
    init_logging(config.logging.clone()).context("failed to initialize logging")?;

    info!(
        address = %config.socket_addr(),
        database = strip_path(&config.database_url),
        "Starting warbler"
    );

    let service = CatalogService::new(config)
        .await
        .context("failed to open catalogue database")?;
    service
        .run(shutdown_signal())
        .await
        .context("server terminated abnormally")?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            warn!(error = %e, "Cannot listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
