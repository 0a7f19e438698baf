//! Entity repository trait and its SQLite implementation

use crate::descriptor::{Entity, FieldValue};
use crate::error::{LibraryError, Result};
use crate::filter::Filter;
use async_trait::async_trait;
use sqlx::query::{Query, QueryAs};
use sqlx::sqlite::SqliteArguments;
use sqlx::{query, query_as, Sqlite, SqlitePool};
use std::marker::PhantomData;
use tracing::{debug, warn};

/// Storage gateway for one entity kind.
#[async_trait]
pub trait EntityRepository<E: Entity>: Send + Sync {
    /// Find an entity by primary key
    ///
    /// # Returns
    /// - `Ok(Some(entity))` if found
    /// - `Ok(None)` if not found
    /// - `Err` if database error occurs
    async fn find_by_id(&self, id: i64) -> Result<Option<E>>;

    /// All rows matching `filter`, primary key ascending
    async fn find_matching(&self, filter: &Filter) -> Result<Vec<E>>;

    /// Insert a new entity and return the key the store assigned
    ///
    /// The entity's own key is ignored.
    ///
    /// # Errors
    /// Returns error if:
    /// - The entity kind is read-only
    /// - Validation fails
    /// - Database error occurs
    async fn insert(&self, entity: &E) -> Result<i64>;

    /// Replace every writable field of the row keyed by `entity.key()`
    ///
    /// # Errors
    /// Returns error if:
    /// - The entity kind is read-only
    /// - Validation fails
    /// - No row has the key (`UnknownKey`)
    /// - Database error occurs
    async fn update(&self, entity: &E) -> Result<()>;

    /// Count rows
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of [`EntityRepository`], driven by the entity's
/// descriptor.
pub struct SqliteEntityRepository<E> {
    pool: SqlitePool,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> SqliteEntityRepository<E> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    fn select_sql(where_clause: &str) -> String {
        let descriptor = E::descriptor();
        format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {} ASC",
            descriptor.select_list(),
            descriptor.source,
            where_clause,
            descriptor.key().expr
        )
    }

    fn validate(entity: &E) -> Result<()> {
        let descriptor = E::descriptor();
        descriptor.ensure_mutable()?;
        entity
            .validate()
            .map_err(|message| LibraryError::InvalidInput {
                field: descriptor.shape.to_string(),
                message,
            })
    }
}

fn bind_as<'q, O>(
    query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    value: &FieldValue,
) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
    match value {
        FieldValue::Null => query.bind(None::<i64>),
        FieldValue::Integer(v) => query.bind(*v),
        FieldValue::Real(v) => query.bind(*v),
        FieldValue::Text(v) => query.bind(v.clone()),
    }
}

fn bind<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &FieldValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        FieldValue::Null => query.bind(None::<i64>),
        FieldValue::Integer(v) => query.bind(*v),
        FieldValue::Real(v) => query.bind(*v),
        FieldValue::Text(v) => query.bind(v.clone()),
    }
}

#[async_trait]
impl<E: Entity> EntityRepository<E> for SqliteEntityRepository<E> {
    async fn find_by_id(&self, id: i64) -> Result<Option<E>> {
        let key = E::descriptor().key().expr;
        let sql = Self::select_sql(&format!("{key} = ?"));

        let entity = query_as::<_, E>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entity)
    }

    async fn find_matching(&self, filter: &Filter) -> Result<Vec<E>> {
        let sql = Self::select_sql(&filter.predicate());
        debug!(table = E::descriptor().table, sql = %sql, "Executing filter");

        let mut statement = query_as::<_, E>(&sql);
        for value in filter.binds() {
            statement = bind_as(statement, value);
        }

        let rows = statement.fetch_all(&self.pool).await.map_err(|e| {
            warn!(table = E::descriptor().table, error = %e, "Filter query failed");
            LibraryError::Database(e)
        })?;

        Ok(rows)
    }

    async fn insert(&self, entity: &E) -> Result<i64> {
        Self::validate(entity)?;

        let descriptor = E::descriptor();
        let values = entity.values();
        let (columns, binds): (Vec<_>, Vec<_>) = descriptor
            .writable_fields()
            .map(|(index, field)| (field.column, &values[index]))
            .unzip();

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", descriptor.table)
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                descriptor.table,
                columns.join(", "),
                vec!["?"; columns.len()].join(", ")
            )
        };

        let mut statement = query(&sql);
        for value in binds {
            statement = bind(statement, value);
        }

        let result = statement.execute(&self.pool).await?;
        Ok(result.last_insert_rowid())
    }

    async fn update(&self, entity: &E) -> Result<()> {
        Self::validate(entity)?;

        let descriptor = E::descriptor();
        let values = entity.values();
        let (assignments, binds): (Vec<_>, Vec<_>) = descriptor
            .writable_fields()
            .map(|(index, field)| (format!("{} = ?", field.column), &values[index]))
            .unzip();

        if assignments.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            descriptor.table,
            assignments.join(", "),
            descriptor.key().column
        );

        let mut statement = query(&sql);
        for value in binds {
            statement = bind(statement, value);
        }

        let result = statement.bind(entity.key()).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::UnknownKey {
                entity: descriptor.shape.to_string(),
                id: entity.key(),
            });
        }

        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", E::descriptor().table);
        let (count,): (i64,) = query_as(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, load_fixtures};
    use crate::models::{Album, Artist, Genre, Image, Library, Song};

    async fn setup_test_pool() -> SqlitePool {
        let pool = create_test_pool().await.unwrap();
        load_fixtures(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let pool = setup_test_pool().await;

        let genre = SqliteEntityRepository::<Genre>::new(pool.clone())
            .find_by_id(1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(genre.name, "Jazz");

        let missing = SqliteEntityRepository::<Album>::new(pool)
            .find_by_id(99)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_song_artist_resolves_through_album() {
        let pool = setup_test_pool().await;
        let repo = SqliteEntityRepository::<Song>::new(pool);

        let song = repo.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(song.title, "In the Night");
        assert_eq!(song.artist, "BADBADNOTGOOD");
        assert_eq!(song.duration, 1993.0);
        assert_eq!(song.num_tracks, Some(20));

        let something = repo.find_by_id(6).await.unwrap().unwrap();
        assert_eq!(something.track, None);
        assert_eq!(something.num_disks, None);
    }

    #[tokio::test]
    async fn test_find_matching_orders_by_key() {
        let pool = setup_test_pool().await;
        let repo = SqliteEntityRepository::<Song>::new(pool);

        let example = Song {
            artist: "BADBADNOTGOOD".to_string(),
            ..Default::default()
        };
        let songs = repo
            .find_matching(&Filter::from_example(&example))
            .await
            .unwrap();
        let ids: Vec<_> = songs.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 5, 6]);
    }

    #[tokio::test]
    async fn test_empty_filter_matches_every_row() {
        let pool = setup_test_pool().await;
        let repo = SqliteEntityRepository::<Artist>::new(pool);

        let artists = repo.find_matching(&Filter::all()).await.unwrap();
        assert_eq!(artists.len() as i64, repo.count().await.unwrap());
        assert_eq!(artists[1].name, "BADBADNOTGOOD & Ghostface Killah");
    }

    #[tokio::test]
    async fn test_conjunction_narrows() {
        let pool = setup_test_pool().await;
        let repo = SqliteEntityRepository::<Album>::new(pool);

        let example = Album {
            artist: 1,
            year: 2012,
            ..Default::default()
        };
        let albums = repo
            .find_matching(&Filter::from_example(&example))
            .await
            .unwrap();
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].title, "IV");
    }

    #[tokio::test]
    async fn test_insert_assigns_key() {
        let pool = setup_test_pool().await;
        let repo = SqliteEntityRepository::<Library>::new(pool);

        let mut library = Library::new("NewMusic", "/srv/music");
        library.id = 42;
        let id = repo.insert(&library).await.unwrap();
        assert_eq!(id, 2);

        let found = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.name, "NewMusic");
        assert_eq!(found.path, "/srv/music");
        assert!(repo.find_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_replaces_writable_fields() {
        let pool = setup_test_pool().await;
        let repo = SqliteEntityRepository::<Library>::new(pool);

        let mut library = Library::new("Renamed", "");
        library.id = 1;
        repo.update(&library).await.unwrap();

        let found = repo.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(found, library);
    }

    #[tokio::test]
    async fn test_update_unknown_key() {
        let pool = setup_test_pool().await;
        let repo = SqliteEntityRepository::<Library>::new(pool);

        let mut library = Library::new("NewMusic", "");
        library.id = 99;
        let err = repo.update(&library).await.unwrap_err();
        assert!(matches!(err, LibraryError::UnknownKey { id: 99, .. }));
    }

    #[tokio::test]
    async fn test_writes_are_validated() {
        let pool = setup_test_pool().await;

        let libraries = SqliteEntityRepository::<Library>::new(pool.clone());
        let err = libraries.insert(&Library::new(" ", "/x")).await.unwrap_err();
        assert!(matches!(err, LibraryError::InvalidInput { .. }));

        let images = SqliteEntityRepository::<Image>::new(pool);
        let err = images.insert(&Image::default()).await.unwrap_err();
        assert!(matches!(err, LibraryError::ReadOnly { .. }));
        assert_eq!(images.count().await.unwrap(), 1);
    }
}
