//! # Server Configuration
//!
//! Builds the [`ServerConfig`] the catalogue server starts from.
//!
//! ## Overview
//!
//! Configuration is assembled with a builder and validated fail-fast in
//! `build()`. In deployment it usually comes from the environment:
//!
//! | Variable | Default |
//! |---|---|
//! | `WARBLER_HOST` | `0.0.0.0` |
//! | `WARBLER_PORT` | `8080` |
//! | `WARBLER_DATABASE_URL` | `sqlite:warbler.db` |
//! | `WARBLER_MAX_CONNECTIONS` | `5` |
//! | `WARBLER_LOG_FORMAT` | `pretty` in debug builds, `json` in release |
//! | `WARBLER_LOG_LEVEL` | `info` |
//! | `RUST_LOG` | unset; replaces the per-crate filter when present |
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::ServerConfig;
//!
//! let config = ServerConfig::builder()
//!     .port(9000)
//!     .database_url("sqlite::memory:")
//!     .build()?;
//! assert_eq!(config.socket_addr(), "0.0.0.0:9000");
//! # Ok::<(), core_runtime::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Invalid settings are reported as [`Error::Config`] with a message naming
//! the offending setting:
//!
//! ```
//! use core_runtime::config::ServerConfig;
//!
//! let err = ServerConfig::builder().max_connections(0).build().unwrap_err();
//! assert!(err.to_string().contains("max connections"));
//! ```

use crate::error::{Error, Result};
use crate::logging::{LogFormat, LogLevel, LoggingConfig};
use std::str::FromStr;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE_URL: &str = "sqlite:warbler.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Upper bound on the connection pool size.
const MAX_POOL_SIZE: u32 = 100;

/// Everything the server needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to listen on
    pub host: String,

    pub port: u16,

    /// `sqlite:` URL of the catalogue database
    pub database_url: String,

    /// Upper bound on pooled database connections
    pub max_connections: u32,

    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through `lookup`, which maps a variable name to its value.
    ///
    /// Unset variables keep their defaults. Set but unparsable values are
    /// errors rather than silently falling back.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(host) = lookup("WARBLER_HOST") {
            builder = builder.host(host);
        }
        if let Some(port) = lookup("WARBLER_PORT") {
            builder = builder.port(parse_setting("WARBLER_PORT", &port)?);
        }
        if let Some(url) = lookup("WARBLER_DATABASE_URL") {
            builder = builder.database_url(url);
        }
        if let Some(max) = lookup("WARBLER_MAX_CONNECTIONS") {
            builder = builder.max_connections(parse_setting("WARBLER_MAX_CONNECTIONS", &max)?);
        }
        if let Some(format) = lookup("WARBLER_LOG_FORMAT") {
            builder = builder.log_format(format.parse::<LogFormat>()?);
        }
        if let Some(level) = lookup("WARBLER_LOG_LEVEL") {
            builder = builder.log_level(level.parse::<LogLevel>()?);
        }
        if let Some(filter) = lookup("RUST_LOG").filter(|f| !f.trim().is_empty()) {
            builder = builder.log_filter(filter);
        }

        builder.build()
    }

    /// `host:port` for binding the listener.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates the configuration.
    ///
    /// This checks:
    /// - Host is not empty
    /// - Database URL is not empty
    /// - Max connections is between 1 and 100
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("Host cannot be empty".to_string()));
        }

        if self.database_url.trim().is_empty() {
            return Err(Error::Config("Database URL cannot be empty".to_string()));
        }

        if !(1..=MAX_POOL_SIZE).contains(&self.max_connections) {
            return Err(Error::Config(format!(
                "max connections must be between 1 and {MAX_POOL_SIZE}, got {}",
                self.max_connections
            )));
        }

        Ok(())
    }
}

fn parse_setting<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{name}: invalid value '{value}': {e}")))
}

/// Builder for [`ServerConfig`]. Unset fields take the documented defaults.
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = url.into();
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.config.max_connections = max;
        self
    }

    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.config.logging.format = format;
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.logging.filter = Some(filter.into());
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<ServerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::builder().build().unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url, "sqlite:warbler.db");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_builder_overrides() {
        let config = ServerConfig::builder()
            .host("127.0.0.1")
            .port(3000)
            .database_url("sqlite:/tmp/catalogue.db")
            .max_connections(20)
            .log_format(LogFormat::Compact)
            .log_level(LogLevel::Debug)
            .log_filter("core_service=trace")
            .build()
            .unwrap();

        assert_eq!(config.socket_addr(), "127.0.0.1:3000");
        assert_eq!(config.database_url, "sqlite:/tmp/catalogue.db");
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.filter.as_deref(), Some("core_service=trace"));
    }

    #[test]
    fn test_validation_failures() {
        assert!(ServerConfig::builder().host(" ").build().is_err());
        assert!(ServerConfig::builder().database_url("").build().is_err());
        assert!(ServerConfig::builder().max_connections(0).build().is_err());
        assert!(ServerConfig::builder().max_connections(101).build().is_err());
        assert!(ServerConfig::builder().max_connections(100).build().is_ok());
    }

    #[test]
    fn test_from_lookup_reads_every_variable() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("WARBLER_HOST", "127.0.0.1"),
            ("WARBLER_PORT", "9090"),
            ("WARBLER_DATABASE_URL", "sqlite::memory:"),
            ("WARBLER_MAX_CONNECTIONS", "1"),
            ("WARBLER_LOG_FORMAT", "json"),
            ("WARBLER_LOG_LEVEL", "warn"),
            ("RUST_LOG", "core_library=debug"),
        ]))
        .unwrap();

        assert_eq!(config.socket_addr(), "127.0.0.1:9090");
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.logging.filter.as_deref(), Some("core_library=debug"));
    }

    #[test]
    fn test_from_lookup_empty_environment_uses_defaults() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = ServerConfig::from_lookup(lookup_from(&[("WARBLER_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("WARBLER_PORT"));

        assert!(ServerConfig::from_lookup(lookup_from(&[("WARBLER_PORT", "70000")])).is_err());
        assert!(ServerConfig::from_lookup(lookup_from(&[("WARBLER_LOG_LEVEL", "loud")])).is_err());
        assert!(
            ServerConfig::from_lookup(lookup_from(&[("WARBLER_MAX_CONNECTIONS", "500")])).is_err()
        );
    }

    #[test]
    fn test_blank_rust_log_is_ignored() {
        let config = ServerConfig::from_lookup(lookup_from(&[("RUST_LOG", "  ")])).unwrap();
        assert_eq!(config.logging.filter, None);
    }
}
