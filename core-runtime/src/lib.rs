//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the catalogue server:
//! - Logging and tracing setup
//! - Server configuration with environment loading and validation
//!
//! ## Overview
//!
//! Other crates only emit `tracing` events; this crate decides where they go.
//! The binary builds a [`config::ServerConfig`], hands its logging section to
//! [`logging::init_logging`], and passes the rest to the service layer.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
