//! # Catalogue Library
//!
//! Owns the catalogue database and the generic query-by-example engine.
//!
//! ## Overview
//!
//! This crate manages:
//! - SQLite schema, migrations and test fixtures
//! - Catalogue models and their static descriptors
//! - Filters built from partially populated example entities
//! - A descriptor-driven repository shared by every entity kind
//! - Filter batches whose results stay grouped per filter

pub mod db;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod models;
pub mod query;
pub mod repositories;

pub use descriptor::{decode_document, decode_entity, entity_from_document, Entity};
pub use error::{LibraryError, Result};
pub use filter::Filter;
pub use query::{execute_batch, FilterBatch, QueryResult};
pub use repositories::{EntityRepository, SqliteEntityRepository};
