//! Entity registry: route segment to handler.
//!
//! Populated once at startup and read-only afterwards.

use crate::handlers::{CatalogRoute, EntityHandler};
use core_library::models::{Album, Artist, Genre, Image, Library, Song};
use core_library::{Entity, EntityRepository, SqliteEntityRepository};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct EntityRegistry {
    routes: BTreeMap<&'static str, Arc<dyn CatalogRoute>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every catalogue table backed by SQLite repositories on `pool`.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self::new()
            .register::<Library>(Arc::new(SqliteEntityRepository::new(pool.clone())))
            .register::<Genre>(Arc::new(SqliteEntityRepository::new(pool.clone())))
            .register::<Artist>(Arc::new(SqliteEntityRepository::new(pool.clone())))
            .register::<Album>(Arc::new(SqliteEntityRepository::new(pool.clone())))
            .register::<Song>(Arc::new(SqliteEntityRepository::new(pool.clone())))
            .register::<Image>(Arc::new(SqliteEntityRepository::new(pool)))
    }

    /// Serve `E`'s table from `repository`, replacing any earlier handler.
    pub fn register<E: Entity>(mut self, repository: Arc<dyn EntityRepository<E>>) -> Self {
        let route: Arc<dyn CatalogRoute> = Arc::new(EntityHandler::new(repository));
        self.routes.insert(route.table(), route);
        self
    }

    pub fn route(&self, table: &str) -> Option<&Arc<dyn CatalogRoute>> {
        self.routes.get(table)
    }

    /// Registered tables in name order.
    pub fn tables(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.routes.keys().copied()
    }
}

impl std::fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("tables", &self.tables().collect::<Vec<_>>())
            .finish()
    }
}
