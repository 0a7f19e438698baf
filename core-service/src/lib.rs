//! # Catalogue HTTP Service
//!
//! Serves the music catalogue over HTTP in JSON or EDN.
//!
//! - [`registry`] maps route segments to per-table handlers
//! - [`handlers`] implements lookup, query batches, create and update for one
//!   entity kind
//! - [`dispatcher`] resolves format, table and identifier for a request
//! - [`http`] binds the dispatcher to axum routes
//! - [`service`] opens the database and runs the server
//!
//! ## Example
//!
//! ```rust,ignore
//! use core_runtime::config::ServerConfig;
//! use core_service::CatalogService;
//!
//! let service = CatalogService::new(ServerConfig::from_env()?).await?;
//! service.run(async { tokio::signal::ctrl_c().await.ok(); }).await?;
//! ```

pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod http;
pub mod registry;
pub mod service;

pub use dispatcher::{Dispatcher, Encoded};
pub use error::{Result, ServiceError};
pub use handlers::{CatalogRoute, EntityHandler};
pub use registry::EntityRegistry;
pub use service::CatalogService;
