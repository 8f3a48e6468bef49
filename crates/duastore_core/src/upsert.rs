//! The change-aware upsert engine.
//!
//! A write only reaches the store when it actually changes a record:
//!
//! 1. Split the payload into id and content fields
//! 2. With an id, read the current record (absence means insert)
//! 3. Deep-compare content; equal content is a no-op that keeps the
//!    current version
//! 4. Otherwise stamp a new version and replace the document
//!
//! Without an id, a single write inserts under the acceptance time as id.
//! Batch writes share one timestamp and isolate per-record failures.
//!
//! There is no cross-request locking: two racing writes to one id may both
//! read before either writes, and the last one wins.

use crate::clock::Clock;
use crate::collection::Collection;
use crate::config::{BatchPolicy, EngineConfig};
use crate::error::{CoreError, CoreResult};
use crate::record::{IncomingRecord, StoredRecord};
use duastore_codec::{documents_equal, Document};
use duastore_storage::DocumentStore;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a write was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// No record existed; one was created.
    Inserted,
    /// The record existed with different content and was replaced.
    Updated,
    /// The content was unchanged; nothing was written.
    Unchanged,
}

/// The result of one successful upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertResult {
    /// The record as stored after the write.
    pub record: StoredRecord,
    /// How the write was applied.
    pub kind: WriteKind,
}

/// The outcome of one element of a batch write.
#[derive(Debug)]
pub enum BatchOutcome {
    /// The element was upserted (possibly as a no-op).
    Stored(UpsertResult),
    /// The element carried no id and the batch policy skips such elements.
    Skipped,
    /// The element failed; siblings were unaffected.
    Failed(CoreError),
}

impl BatchOutcome {
    /// Returns the upsert result, if the element was stored.
    pub fn stored(&self) -> Option<&UpsertResult> {
        match self {
            BatchOutcome::Stored(result) => Some(result),
            _ => None,
        }
    }

    /// Returns true if the element was skipped.
    pub fn is_skipped(&self) -> bool {
        matches!(self, BatchOutcome::Skipped)
    }

    /// Returns true if the element failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, BatchOutcome::Failed(_))
    }
}

/// Inserts, updates or skips records depending on whether their content
/// changed.
pub struct UpsertEngine {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl UpsertEngine {
    /// Creates an engine over a store and clock.
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Upserts one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload has an unusable id or the store
    /// fails.
    pub async fn upsert(&self, collection: Collection, payload: Document) -> CoreResult<UpsertResult> {
        let incoming = IncomingRecord::from_document(payload)?;
        let now = self.clock.now_millis();
        match incoming.id {
            Some(id) => {
                self.upsert_identified(collection, id, incoming.fields, now)
                    .await
            }
            None => {
                self.write(collection, now.to_string(), incoming.fields, now, WriteKind::Inserted)
                    .await
            }
        }
    }

    /// Upserts many records, one outcome per input in input order.
    ///
    /// Elements are processed concurrently against one shared timestamp, so
    /// every changed record in the batch gets the same version.
    ///
    /// # Errors
    ///
    /// Only fails as a whole when the batch exceeds the configured limit.
    /// Per-element failures are reported as [`BatchOutcome::Failed`].
    pub async fn upsert_all(
        &self,
        collection: Collection,
        payloads: Vec<Document>,
    ) -> CoreResult<Vec<BatchOutcome>> {
        if payloads.len() > self.config.max_batch {
            return Err(CoreError::BatchTooLarge {
                len: payloads.len(),
                max: self.config.max_batch,
            });
        }

        let now = self.clock.now_millis();
        let outcomes = join_all(
            payloads
                .into_iter()
                .enumerate()
                .map(|(index, payload)| self.upsert_batch_element(collection, index, payload, now)),
        )
        .await;

        let failed = outcomes.iter().filter(|o| o.is_failed()).count();
        let skipped = outcomes.iter().filter(|o| o.is_skipped()).count();
        info!(
            %collection,
            total = outcomes.len(),
            failed,
            skipped,
            version = now,
            "batch upsert finished"
        );
        Ok(outcomes)
    }

    async fn upsert_batch_element(
        &self,
        collection: Collection,
        index: usize,
        payload: Document,
        now: u64,
    ) -> BatchOutcome {
        let incoming = match IncomingRecord::from_document(payload) {
            Ok(incoming) => incoming,
            Err(error) => {
                warn!(%collection, index, %error, "rejected batch element");
                return BatchOutcome::Failed(error);
            }
        };

        let result = match (incoming.id, self.config.batch_policy) {
            (Some(id), _) => {
                self.upsert_identified(collection, id, incoming.fields, now)
                    .await
            }
            (None, BatchPolicy::SkipUnidentified) => {
                debug!(%collection, index, "skipping batch element without id");
                return BatchOutcome::Skipped;
            }
            (None, BatchPolicy::InsertUnidentified) => {
                let id = format!("{now}-{index}");
                self.write(collection, id, incoming.fields, now, WriteKind::Inserted)
                    .await
            }
        };

        match result {
            Ok(result) => BatchOutcome::Stored(result),
            Err(error) => {
                warn!(%collection, index, %error, "batch element failed");
                BatchOutcome::Failed(error)
            }
        }
    }

    async fn upsert_identified(
        &self,
        collection: Collection,
        id: String,
        fields: Document,
        now: u64,
    ) -> CoreResult<UpsertResult> {
        let current = self
            .store
            .get(collection.as_str(), &id)
            .await?
            .map(|document| StoredRecord::from_document(id.clone(), document));

        match current {
            Some(current) if documents_equal(&fields, &current.fields) => {
                debug!(%collection, id = %current.id, version = current.version, "unchanged, skipping write");
                Ok(UpsertResult {
                    record: current,
                    kind: WriteKind::Unchanged,
                })
            }
            Some(current) => {
                // Versions never move backwards, even if the clock does.
                let version = now.max(current.version.saturating_add(1));
                self.write(collection, id, fields, version, WriteKind::Updated)
                    .await
            }
            None => {
                self.write(collection, id, fields, now, WriteKind::Inserted)
                    .await
            }
        }
    }

    async fn write(
        &self,
        collection: Collection,
        id: String,
        fields: Document,
        version: u64,
        kind: WriteKind,
    ) -> CoreResult<UpsertResult> {
        let record = StoredRecord::new(id, fields, version);
        self.store
            .put(collection.as_str(), &record.id, record.to_document())
            .await?;
        info!(%collection, id = %record.id, version, ?kind, "record written");
        Ok(UpsertResult { record, kind })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use async_trait::async_trait;
    use duastore_codec::Value;
    use duastore_storage::{InMemoryStore, StorageError, StorageResult, StoredDocument};

    const T0: u64 = 1_700_000_000_000;

    fn payload(pairs: Vec<(&str, Value)>) -> Document {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn setup(config: EngineConfig) -> (UpsertEngine, Arc<InMemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let engine = UpsertEngine::new(store.clone(), clock.clone(), config);
        (engine, store, clock)
    }

    /// Fails every operation touching the given id.
    struct PoisonedIdStore {
        inner: InMemoryStore,
        poisoned: &'static str,
    }

    #[async_trait]
    impl DocumentStore for PoisonedIdStore {
        async fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Document>> {
            if id == self.poisoned {
                return Err(StorageError::Unavailable("read timed out".into()));
            }
            self.inner.get(collection, id).await
        }

        async fn get_all(&self, collection: &str) -> StorageResult<Vec<StoredDocument>> {
            self.inner.get_all(collection).await
        }

        async fn put(&self, collection: &str, id: &str, document: Document) -> StorageResult<()> {
            self.inner.put(collection, id, document).await
        }
    }

    #[tokio::test]
    async fn insert_with_explicit_id() {
        let (engine, store, _) = setup(EngineConfig::default());

        let result = engine
            .upsert(
                Collection::Tags,
                payload(vec![("id", Value::Integer(7)), ("name", Value::from("Fasting"))]),
            )
            .await
            .unwrap();

        assert_eq!(result.kind, WriteKind::Inserted);
        assert_eq!(result.record.id, "7");
        assert_eq!(result.record.version, T0);
        assert_eq!(store.write_count(), 1);

        let stored = store.get("tags", "7").await.unwrap().unwrap();
        assert_eq!(stored.get("version"), Some(&Value::Integer(T0 as i64)));
        assert_eq!(stored.get("id"), None);
    }

    #[tokio::test]
    async fn identical_write_is_a_no_op() {
        let (engine, store, clock) = setup(EngineConfig::default());
        let write = || payload(vec![("id", Value::Integer(7)), ("name", Value::from("Fasting"))]);

        let first = engine.upsert(Collection::Tags, write()).await.unwrap();
        clock.advance(1_000);
        let second = engine.upsert(Collection::Tags, write()).await.unwrap();

        assert_eq!(second.kind, WriteKind::Unchanged);
        assert_eq!(second.record.id, "7");
        assert_eq!(second.record.version, first.record.version);
        assert_eq!(second.record.fields, first.record.fields);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn changed_write_bumps_version() {
        let (engine, store, clock) = setup(EngineConfig::default());

        let first = engine
            .upsert(
                Collection::Duas,
                payload(vec![("id", Value::from("d1")), ("text", Value::from("A"))]),
            )
            .await
            .unwrap();
        clock.advance(10);
        let second = engine
            .upsert(
                Collection::Duas,
                payload(vec![("id", Value::from("d1")), ("text", Value::from("B"))]),
            )
            .await
            .unwrap();

        assert_eq!(second.kind, WriteKind::Updated);
        assert!(second.record.version > first.record.version);
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn version_never_regresses_when_clock_stalls() {
        let (engine, _, clock) = setup(EngineConfig::default());

        let first = engine
            .upsert(
                Collection::Tags,
                payload(vec![("id", Value::Integer(1)), ("name", Value::from("a"))]),
            )
            .await
            .unwrap();
        clock.set(T0 - 5_000);
        let second = engine
            .upsert(
                Collection::Tags,
                payload(vec![("id", Value::Integer(1)), ("name", Value::from("b"))]),
            )
            .await
            .unwrap();

        assert_eq!(second.record.version, first.record.version + 1);
    }

    #[tokio::test]
    async fn removing_a_field_is_a_change() {
        let (engine, store, _) = setup(EngineConfig::default());
        store.seed(
            "themes",
            "t1",
            payload(vec![
                ("name", Value::from("Patience")),
                ("color", Value::from("green")),
                ("version", Value::Integer(1)),
            ]),
        );

        let result = engine
            .upsert(
                Collection::Themes,
                payload(vec![("id", Value::from("t1")), ("name", Value::from("Patience"))]),
            )
            .await
            .unwrap();

        assert_eq!(result.kind, WriteKind::Updated);
        let stored = store.get("themes", "t1").await.unwrap().unwrap();
        assert_eq!(stored.get("color"), None);
    }

    #[tokio::test]
    async fn integer_and_float_content_compare_equal() {
        let (engine, store, _) = setup(EngineConfig::default());
        store.seed(
            "tags",
            "1",
            payload(vec![("order", Value::Integer(2)), ("version", Value::Integer(5))]),
        );

        let result = engine
            .upsert(
                Collection::Tags,
                payload(vec![("id", Value::Integer(1)), ("order", Value::Float(2.0))]),
            )
            .await
            .unwrap();

        assert_eq!(result.kind, WriteKind::Unchanged);
        assert_eq!(result.record.version, 5);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn missing_id_generates_time_based_id() {
        let (engine, store, _) = setup(EngineConfig::default());

        let result = engine
            .upsert(Collection::Tags, payload(vec![("name", Value::from("New"))]))
            .await
            .unwrap();

        assert_eq!(result.kind, WriteKind::Inserted);
        assert_eq!(result.record.id, T0.to_string());
        assert!(store.get("tags", &T0.to_string()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn single_write_propagates_store_failure() {
        let store = Arc::new(PoisonedIdStore {
            inner: InMemoryStore::new(),
            poisoned: "bad",
        });
        let engine = UpsertEngine::new(store, Arc::new(ManualClock::new(T0)), EngineConfig::default());

        let result = engine
            .upsert(Collection::Tags, payload(vec![("id", Value::from("bad"))]))
            .await;
        assert!(matches!(result, Err(CoreError::Storage(_))));
    }

    #[tokio::test]
    async fn batch_skips_unidentified_by_default() {
        let (engine, store, _) = setup(EngineConfig::default());

        let outcomes = engine
            .upsert_all(
                Collection::Duas,
                vec![
                    payload(vec![("id", Value::Integer(1)), ("text", Value::from("A"))]),
                    payload(vec![("text", Value::from("B"))]),
                ],
            )
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        let first = outcomes[0].stored().unwrap();
        assert_eq!(first.kind, WriteKind::Inserted);
        assert_eq!(first.record.id, "1");
        assert!(outcomes[1].is_skipped());
        assert_eq!(store.len("duas"), 1);
    }

    #[tokio::test]
    async fn batch_can_insert_unidentified() {
        let config = EngineConfig::new().with_batch_policy(BatchPolicy::InsertUnidentified);
        let (engine, store, _) = setup(config);

        let outcomes = engine
            .upsert_all(
                Collection::Duas,
                vec![
                    payload(vec![("text", Value::from("A"))]),
                    payload(vec![("text", Value::from("B"))]),
                ],
            )
            .await
            .unwrap();

        let ids: Vec<_> = outcomes
            .iter()
            .map(|o| o.stored().unwrap().record.id.clone())
            .collect();
        assert_eq!(ids, vec![format!("{T0}-0"), format!("{T0}-1")]);
        assert_eq!(store.len("duas"), 2);
    }

    #[tokio::test]
    async fn batch_shares_one_version() {
        let (engine, _, _) = setup(EngineConfig::default());

        let outcomes = engine
            .upsert_all(
                Collection::Tags,
                (1..=5)
                    .map(|i| payload(vec![("id", Value::Integer(i)), ("name", Value::from("x"))]))
                    .collect(),
            )
            .await
            .unwrap();

        assert!(outcomes
            .iter()
            .all(|o| o.stored().map(|r| r.record.version) == Some(T0)));
    }

    #[tokio::test]
    async fn batch_stamps_diverge_when_clock_lags() {
        let (engine, store, clock) = setup(EngineConfig::default());
        store.seed(
            "tags",
            "a",
            payload(vec![("name", Value::from("old")), ("version", Value::Integer(5_000))]),
        );
        clock.set(1_000);

        let outcomes = engine
            .upsert_all(
                Collection::Tags,
                vec![
                    payload(vec![("id", Value::from("a")), ("name", Value::from("new"))]),
                    payload(vec![("id", Value::from("b")), ("name", Value::from("b"))]),
                ],
            )
            .await
            .unwrap();

        let versions: Vec<_> = outcomes
            .iter()
            .map(|o| o.stored().map(|r| r.record.version))
            .collect();
        assert_eq!(versions, vec![Some(5_001), Some(1_000)]);
    }

    #[tokio::test]
    async fn batch_isolates_element_failures() {
        let store = Arc::new(PoisonedIdStore {
            inner: InMemoryStore::new(),
            poisoned: "2",
        });
        let engine = UpsertEngine::new(
            store.clone(),
            Arc::new(ManualClock::new(T0)),
            EngineConfig::default(),
        );

        let outcomes = engine
            .upsert_all(
                Collection::Tags,
                vec![
                    payload(vec![("id", Value::Integer(1)), ("name", Value::from("a"))]),
                    payload(vec![("id", Value::Integer(2)), ("name", Value::from("b"))]),
                    payload(vec![("id", Value::from(vec![1])), ("name", Value::from("c"))]),
                    payload(vec![("id", Value::Integer(3)), ("name", Value::from("d"))]),
                ],
            )
            .await
            .unwrap();

        assert!(outcomes[0].stored().is_some());
        assert!(matches!(outcomes[1], BatchOutcome::Failed(CoreError::Storage(_))));
        assert!(matches!(outcomes[2], BatchOutcome::Failed(CoreError::InvalidRecord(_))));
        assert!(outcomes[3].stored().is_some());
        assert_eq!(store.inner.len("tags"), 2);
    }

    #[tokio::test]
    async fn batch_mixes_unchanged_and_updated() {
        let (engine, store, clock) = setup(EngineConfig::default());
        store.seed(
            "themes",
            "a",
            payload(vec![("name", Value::from("same")), ("version", Value::Integer(1))]),
        );
        store.seed(
            "themes",
            "b",
            payload(vec![("name", Value::from("old")), ("version", Value::Integer(1))]),
        );
        clock.set(T0);

        let outcomes = engine
            .upsert_all(
                Collection::Themes,
                vec![
                    payload(vec![("id", Value::from("a")), ("name", Value::from("same"))]),
                    payload(vec![("id", Value::from("b")), ("name", Value::from("new"))]),
                ],
            )
            .await
            .unwrap();

        let a = outcomes[0].stored().unwrap();
        let b = outcomes[1].stored().unwrap();
        assert_eq!((a.kind, a.record.version), (WriteKind::Unchanged, 1));
        assert_eq!((b.kind, b.record.version), (WriteKind::Updated, T0));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected() {
        let (engine, store, _) = setup(EngineConfig::new().with_max_batch(2));

        let result = engine
            .upsert_all(Collection::Tags, vec![Document::new(); 3])
            .await;

        assert!(matches!(
            result,
            Err(CoreError::BatchTooLarge { len: 3, max: 2 })
        ));
        assert_eq!(store.write_count(), 0);
    }
}
