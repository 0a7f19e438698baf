//! # Catalogue Handlers
//!
//! Unique lookup, query-by-example, create and update for one entity kind.
//!
//! Handlers speak in [`LibraryError`](core_library::LibraryError) and encoded
//! bytes; they know nothing about HTTP. [`CatalogRoute`] erases the entity
//! type so the registry can hold every table behind one trait object.

use async_trait::async_trait;
use core_encoding::Format;
use core_library::descriptor::{decode_document, entity_from_document};
use core_library::{execute_batch, Entity, EntityRepository, FilterBatch, LibraryError, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Type-erased handler set for one table.
#[async_trait]
pub trait CatalogRoute: Send + Sync {
    /// Route segment this handler serves.
    fn table(&self) -> &'static str;

    /// Shape name used in diagnostics.
    fn shape(&self) -> &'static str;

    /// One entity by primary key, encoded on its own.
    async fn lookup(&self, format: Format, id: i64) -> Result<Vec<u8>>;

    /// One group per payload (or one group of every row when there are
    /// none), encoded as a sequence of sequences.
    async fn query(&self, format: Format, payloads: &[String]) -> Result<Vec<u8>>;

    /// Insert the decoded payload under a store-assigned key and return the
    /// stored record.
    async fn create(&self, format: Format, body: &[u8]) -> Result<Vec<u8>>;

    /// Replace the writable fields of the row named by the payload's key and
    /// return the stored record.
    async fn update(&self, format: Format, body: &[u8]) -> Result<Vec<u8>>;
}

/// [`CatalogRoute`] for entity kind `E` over any repository.
pub struct EntityHandler<E: Entity> {
    repository: Arc<dyn EntityRepository<E>>,
}

impl<E: Entity> EntityHandler<E> {
    pub fn new(repository: Arc<dyn EntityRepository<E>>) -> Self {
        Self { repository }
    }

    fn encode<T: serde::Serialize + ?Sized>(format: Format, value: &T) -> Result<Vec<u8>> {
        format.encode(value).map_err(LibraryError::Encode)
    }

    /// Read back a row that was just written.
    async fn stored(&self, id: i64) -> Result<E> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::UnknownKey {
                entity: E::descriptor().shape.to_string(),
                id,
            })
    }

    /// Integer key of an update payload.
    fn resolve_key(format: Format, map: &core_encoding::DocumentMap) -> Result<i64> {
        let descriptor = E::descriptor();
        let key = descriptor.key().name;
        match map.get(key) {
            Some(value) => value.as_i64().ok_or_else(|| LibraryError::KeyResolution {
                entity: descriptor.shape.to_string(),
                message: format!("`{key}` must be an integer, got {}", format.kind_of(value)),
            }),
            None => Err(LibraryError::KeyResolution {
                entity: descriptor.shape.to_string(),
                message: format!("`{key}` is missing"),
            }),
        }
    }
}

#[async_trait]
impl<E: Entity> CatalogRoute for EntityHandler<E> {
    fn table(&self) -> &'static str {
        E::descriptor().table
    }

    fn shape(&self) -> &'static str {
        E::descriptor().shape
    }

    async fn lookup(&self, format: Format, id: i64) -> Result<Vec<u8>> {
        debug!(table = self.table(), id, "Unique lookup");

        let entity = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::NotFound {
                entity_type: self.shape().to_string(),
                id: id.to_string(),
            })?;

        Self::encode(format, &entity)
    }

    async fn query(&self, format: Format, payloads: &[String]) -> Result<Vec<u8>> {
        debug!(table = self.table(), filters = payloads.len(), "Query by example");

        let batch = FilterBatch::from_payloads::<E, _>(format, payloads)?;
        let result = execute_batch(self.repository.as_ref(), &batch).await?;

        Self::encode(format, &result)
    }

    async fn create(&self, format: Format, body: &[u8]) -> Result<Vec<u8>> {
        let descriptor = E::descriptor();
        descriptor.ensure_mutable()?;

        let mut map = decode_document(format, body, descriptor.shape)?;
        // The store assigns keys; whatever the caller sent is dropped.
        map.remove(descriptor.key().name);
        let entity: E = entity_from_document(format, map)?;

        let id = self.repository.insert(&entity).await?;
        info!(table = descriptor.table, id, "Entity created");

        Self::encode(format, &self.stored(id).await?)
    }

    async fn update(&self, format: Format, body: &[u8]) -> Result<Vec<u8>> {
        let descriptor = E::descriptor();
        descriptor.ensure_mutable()?;

        let map = decode_document(format, body, descriptor.shape)?;
        let id = Self::resolve_key(format, &map)?;
        let mut entity: E = entity_from_document(format, map)?;
        entity.set_key(id);

        self.repository.update(&entity).await?;
        info!(table = descriptor.table, id, "Entity updated");

        Self::encode(format, &self.stored(id).await?)
    }
}
