//! # Repository Pattern Implementation
//!
//! Storage gateway for the catalogue. A single generic repository serves
//! every entity kind; the entity's descriptor supplies table, columns and
//! joins.
//!
//! ## Architecture
//!
//! - `EntityRepository<E>` defines the interface handlers depend on
//! - `SqliteEntityRepository<E>` implements it with sqlx
//! - All operations return `Result<T>` for error handling
//! - Multi-row reads are ordered by primary key

pub mod entity;

pub use entity::{EntityRepository, SqliteEntityRepository};
