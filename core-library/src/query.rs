//! Query-by-example engine.
//!
//! A request carries zero or more example payloads. Each decodes into a
//! partial entity, each entity becomes one [`Filter`], and each filter runs on
//! its own. Results stay grouped per filter in submission order: a row that
//! matches two filters appears in both groups.

use crate::descriptor::{decode_entity, Entity};
use crate::error::Result;
use crate::filter::Filter;
use crate::repositories::EntityRepository;
use core_encoding::Format;
use serde::Serialize;
use tracing::debug;

/// Filters from one request, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterBatch {
    filters: Vec<Filter>,
}

impl FilterBatch {
    /// Decode every payload into an example of `E`.
    ///
    /// Decoding is all or nothing: the first bad payload fails the batch.
    /// No payloads means one empty filter.
    pub fn from_payloads<E: Entity, P: AsRef<[u8]>>(
        format: Format,
        payloads: &[P],
    ) -> Result<Self> {
        if payloads.is_empty() {
            return Ok(Self {
                filters: vec![Filter::all()],
            });
        }

        let filters = payloads
            .iter()
            .map(|payload| {
                decode_entity::<E>(format, payload.as_ref()).map(|e| Filter::from_example(&e))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { filters })
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// One group of entities per filter. Serializes as a sequence of sequences.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QueryResult<E> {
    pub groups: Vec<Vec<E>>,
}

/// Run each filter of `batch` in order. A storage failure aborts the batch.
pub async fn execute_batch<E: Entity>(
    repository: &dyn EntityRepository<E>,
    batch: &FilterBatch,
) -> Result<QueryResult<E>> {
    let mut groups = Vec::with_capacity(batch.len());
    for filter in batch.filters() {
        groups.push(repository.find_matching(filter).await?);
    }

    debug!(
        table = E::descriptor().table,
        filters = batch.len(),
        rows = groups.iter().map(Vec::len).sum::<usize>(),
        "Query batch executed"
    );

    Ok(QueryResult { groups })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, load_fixtures};
    use crate::error::LibraryError;
    use crate::models::{Album, Song};
    use crate::repositories::SqliteEntityRepository;
    use async_trait::async_trait;
    use mockall::mock;

    mock! {
        SongStore {}

        #[async_trait]
        impl EntityRepository<Song> for SongStore {
            async fn find_by_id(&self, id: i64) -> Result<Option<Song>>;
            async fn find_matching(&self, filter: &Filter) -> Result<Vec<Song>>;
            async fn insert(&self, entity: &Song) -> Result<i64>;
            async fn update(&self, entity: &Song) -> Result<()>;
            async fn count(&self) -> Result<i64>;
        }
    }

    async fn song_repository() -> SqliteEntityRepository<Song> {
        let pool = create_test_pool().await.unwrap();
        load_fixtures(&pool).await.unwrap();
        SqliteEntityRepository::new(pool)
    }

    fn titles(group: &[Song]) -> Vec<&str> {
        group.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn test_no_payloads_is_one_empty_filter() {
        let batch = FilterBatch::from_payloads::<Album, &str>(Format::Json, &[]).unwrap();
        assert_eq!(batch.filters(), &[Filter::all()]);
    }

    #[test]
    fn test_one_bad_payload_fails_the_batch() {
        let payloads = [r#"{:artist "Megadeth"}"#, "4"];
        let err = FilterBatch::from_payloads::<Song, _>(Format::Edn, &payloads).unwrap_err();
        assert_eq!(err.to_string(), "edn: cannot unmarshal int into Song");
    }

    #[tokio::test]
    async fn test_groups_follow_submission_order() {
        let repo = song_repository().await;
        let payloads = [r#"{:artist "Megadeth"}"#, r#"{:artist "Iron Maiden"}"#];
        let batch = FilterBatch::from_payloads::<Song, _>(Format::Edn, &payloads).unwrap();

        let result = execute_batch(&repo, &batch).await.unwrap();
        assert_eq!(result.groups.len(), 2);
        assert_eq!(titles(&result.groups[0]), vec!["Hangar 18"]);
        assert_eq!(titles(&result.groups[1]), vec!["The Ides of March"]);
    }

    #[tokio::test]
    async fn test_overlapping_filters_are_not_merged() {
        let repo = song_repository().await;
        let payloads = [r#"{"album": 1}"#, r#"{"genre": 1}"#, r#"{"album": 1, "genre": 2}"#];
        let batch = FilterBatch::from_payloads::<Song, _>(Format::Json, &payloads).unwrap();

        let result = execute_batch(&repo, &batch).await.unwrap();
        assert_eq!(result.groups[0], result.groups[1]);
        assert_eq!(result.groups[0].len(), 3);
        assert!(result.groups[2].is_empty());
    }

    #[tokio::test]
    async fn test_each_group_equals_its_filter_alone() {
        let repo = song_repository().await;
        let payloads = [r#"{:genre 1}"#, r#"{:title "Ray Gun"}"#];
        let batch = FilterBatch::from_payloads::<Song, _>(Format::Edn, &payloads).unwrap();
        let combined = execute_batch(&repo, &batch).await.unwrap();

        for (i, payload) in payloads.iter().enumerate() {
            let single = FilterBatch::from_payloads::<Song, _>(Format::Edn, &[payload]).unwrap();
            let alone = execute_batch(&repo, &single).await.unwrap();
            assert_eq!(alone.groups, vec![combined.groups[i].clone()]);
        }
    }

    #[tokio::test]
    async fn test_storage_failure_aborts_batch() {
        let mut store = MockSongStore::new();
        store
            .expect_find_matching()
            .times(1)
            .returning(|_| Err(LibraryError::Database(sqlx::Error::PoolTimedOut)));

        let payloads = [r#"{:genre 1}"#, r#"{:genre 2}"#];
        let batch = FilterBatch::from_payloads::<Song, _>(Format::Edn, &payloads).unwrap();
        let err = execute_batch(&store, &batch).await.unwrap_err();
        assert!(matches!(err, LibraryError::Database(_)));
    }

    #[test]
    fn test_result_serializes_as_nested_sequences() {
        let result = QueryResult {
            groups: vec![vec![Album::default()], vec![]],
        };
        let bytes = Format::Edn.encode(&result).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "[[{:id 0 :artist 0 :title \"\" :year 0 :num-tracks 0 :num-disks 0 :duration 0}] []]"
        );
    }
}
