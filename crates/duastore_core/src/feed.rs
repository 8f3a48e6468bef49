//! Snapshot and incremental reads.
//!
//! Clients keep a watermark: the highest `version` they have seen. Asking
//! for changes since that watermark returns every record whose version is
//! strictly greater, so a record is delivered again only if it changed.

use crate::collection::Collection;
use crate::error::CoreResult;
use crate::record::{Record, StoredRecord};
use duastore_storage::DocumentStore;
use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Changed records keyed by collection.
pub type Delta = BTreeMap<Collection, Vec<StoredRecord>>;

/// Read side of the record collections.
pub struct DeltaFeed {
    store: Arc<dyn DocumentStore>,
}

impl DeltaFeed {
    /// Creates a feed over a store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Returns every record of a collection without versions, sorted by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn open(&self, collection: Collection) -> CoreResult<Vec<Record>> {
        let mut records: Vec<Record> = self
            .load(collection)
            .await?
            .into_iter()
            .map(Record::from)
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(%collection, count = records.len(), "opened collection");
        Ok(records)
    }

    /// Returns the records of one collection changed after `since`.
    ///
    /// `None` returns the whole collection. Output is ordered by version,
    /// then id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn changes_since(
        &self,
        collection: Collection,
        since: Option<u64>,
    ) -> CoreResult<Vec<StoredRecord>> {
        let mut records: Vec<StoredRecord> = self
            .load(collection)
            .await?
            .into_iter()
            .filter(|record| since.map_or(true, |since| record.version > since))
            .collect();
        records.sort_by(|a, b| a.version.cmp(&b.version).then_with(|| a.id.cmp(&b.id)));
        debug!(%collection, ?since, count = records.len(), "computed changes");
        Ok(records)
    }

    /// Returns the changes of several collections, fetched concurrently.
    ///
    /// Every requested collection has an entry, possibly empty.
    ///
    /// # Errors
    ///
    /// Fails as a whole if any collection read fails.
    pub async fn delta(&self, collections: &[Collection], since: Option<u64>) -> CoreResult<Delta> {
        let fetched = try_join_all(collections.iter().map(|&collection| async move {
            let records = self.changes_since(collection, since).await?;
            CoreResult::Ok((collection, records))
        }))
        .await?;
        Ok(fetched.into_iter().collect())
    }

    async fn load(&self, collection: Collection) -> CoreResult<Vec<StoredRecord>> {
        let documents = self.store.get_all(collection.as_str()).await?;
        Ok(documents
            .into_iter()
            .map(|stored| StoredRecord::from_document(stored.id, stored.document))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use async_trait::async_trait;
    use duastore_codec::{Document, Value};
    use duastore_storage::{InMemoryStore, StorageError, StorageResult, StoredDocument};
    use proptest::prelude::*;

    fn doc(pairs: Vec<(&str, Value)>) -> Document {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn seeded() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store.seed(
            "tags",
            "a",
            doc(vec![("name", Value::from("A")), ("version", Value::Integer(100))]),
        );
        store.seed(
            "tags",
            "b",
            doc(vec![("name", Value::from("B")), ("version", Value::Integer(200))]),
        );
        store.seed("tags", "legacy", doc(vec![("name", Value::from("L"))]));
        store.seed(
            "duas",
            "d",
            doc(vec![("text", Value::from("D")), ("version", Value::Integer(300))]),
        );
        store
    }

    /// Fails every read of one collection.
    struct BrokenCollection(&'static str);

    #[async_trait]
    impl DocumentStore for BrokenCollection {
        async fn get(&self, _: &str, _: &str) -> StorageResult<Option<Document>> {
            Ok(None)
        }

        async fn get_all(&self, collection: &str) -> StorageResult<Vec<StoredDocument>> {
            if collection == self.0 {
                Err(StorageError::Unavailable("listing failed".into()))
            } else {
                Ok(Vec::new())
            }
        }

        async fn put(&self, _: &str, _: &str, _: Document) -> StorageResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn open_hides_versions() {
        let feed = DeltaFeed::new(seeded());

        let records = feed.open(Collection::Tags).await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "legacy"]);
        for record in &records {
            let json = serde_json::to_value(record).unwrap();
            assert!(json.get("version").is_none());
        }
    }

    #[tokio::test]
    async fn open_empty_collection() {
        let feed = DeltaFeed::new(seeded());
        assert!(feed.open(Collection::Themes).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_watermark_returns_everything() {
        let feed = DeltaFeed::new(seeded());

        let delta = feed.delta(&Collection::ALL, None).await.unwrap();
        assert_eq!(delta.len(), 3);
        assert_eq!(delta[&Collection::Tags].len(), 3);
        assert_eq!(delta[&Collection::Duas].len(), 1);
        assert!(delta[&Collection::Themes].is_empty());

        // Unversioned records sort first as version 0.
        assert_eq!(delta[&Collection::Tags][0].id, "legacy");
        assert_eq!(delta[&Collection::Tags][0].version, 0);
    }

    #[tokio::test]
    async fn watermark_is_strict() {
        let feed = DeltaFeed::new(seeded());

        let changes = feed.changes_since(Collection::Tags, Some(100)).await.unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].id, "b");
        assert_eq!(changes[0].version, 200);

        let json = serde_json::to_value(&changes[0]).unwrap();
        assert_eq!(json["version"], 200);
    }

    #[tokio::test]
    async fn watermark_zero_excludes_unversioned() {
        let feed = DeltaFeed::new(seeded());
        let changes = feed.changes_since(Collection::Tags, Some(0)).await.unwrap();
        assert!(changes.iter().all(|r| r.id != "legacy"));
    }

    #[tokio::test]
    async fn store_failure_fails_the_delta() {
        let feed = DeltaFeed::new(Arc::new(BrokenCollection("duas")));
        let result = feed.delta(&Collection::ALL, Some(0)).await;
        assert!(matches!(result, Err(CoreError::Storage(_))));
    }

    proptest! {
        #[test]
        fn delta_is_monotonic(
            versions in proptest::collection::vec(0u64..1_000, 0..20),
            low in 0u64..1_000,
            bump in 0u64..1_000,
        ) {
            let high = low + bump;
            let store = Arc::new(InMemoryStore::new());
            for (i, version) in versions.iter().enumerate() {
                store.seed(
                    "themes",
                    i.to_string(),
                    doc(vec![("version", Value::Integer(*version as i64))]),
                );
            }
            let feed = DeltaFeed::new(store);

            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (at_low, at_high) = runtime.block_on(async {
                (
                    feed.changes_since(Collection::Themes, Some(low)).await.unwrap(),
                    feed.changes_since(Collection::Themes, Some(high)).await.unwrap(),
                )
            });

            prop_assert!(at_low.iter().all(|r| r.version > low));
            prop_assert!(at_high.iter().all(|r| r.version > high));
            for record in &at_high {
                prop_assert!(at_low.iter().any(|r| r.id == record.id));
            }
            let expected = versions.iter().filter(|v| **v > low).count();
            prop_assert_eq!(at_low.len(), expected);
        }
    }
}
