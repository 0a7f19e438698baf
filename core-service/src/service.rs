//! # Catalogue Service
//!
//! Bootstraps the server from a [`ServerConfig`]: opens and migrates the
//! database, registers every table, builds the router and serves it until
//! shutdown.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use core_library::db::{create_pool, DatabaseConfig};
use core_runtime::config::ServerConfig;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::http;
use crate::registry::EntityRegistry;

const IN_MEMORY_URL: &str = "sqlite::memory:";

pub struct CatalogService {
    config: ServerConfig,
    pool: SqlitePool,
    dispatcher: Arc<Dispatcher>,
}

impl CatalogService {
    /// Open the configured database and register every catalogue table.
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let database = if config.database_url == IN_MEMORY_URL {
            DatabaseConfig::in_memory()
        } else {
            DatabaseConfig::from_url(&config.database_url).max_connections(config.max_connections)
        };
        let pool = create_pool(database).await?;

        Ok(Self::with_pool(config, pool))
    }

    /// Serve an already opened pool.
    pub fn with_pool(config: ServerConfig, pool: SqlitePool) -> Self {
        let registry = EntityRegistry::from_pool(pool.clone());
        Self {
            config,
            pool,
            dispatcher: Arc::new(Dispatcher::new(registry)),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn router(&self) -> Router {
        http::router(Arc::clone(&self.dispatcher))
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    ///
    /// In-flight requests finish before the pool is closed.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        let local_addr = listener.local_addr()?;
        info!(
            address = %local_addr,
            tables = ?self.dispatcher.registry().tables().collect::<Vec<_>>(),
            "Catalogue server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Catalogue server stopped");
        self.pool.close().await;
        Ok(())
    }
}
