//! In-memory document store for testing.

use crate::error::StorageResult;
use crate::store::{DocumentStore, StoredDocument};
use async_trait::async_trait;
use duastore_codec::Document;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

/// An in-memory document store.
///
/// This store keeps all documents in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral deployments that don't need persistence
///
/// It also counts successful `put` calls, which lets tests assert that a
/// no-op write never reached the store.
///
/// # Example
///
/// ```rust
/// use duastore_codec::Document;
/// use duastore_storage::{DocumentStore, InMemoryStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = InMemoryStore::new();
/// store.put("tags", "7", Document::new()).await.unwrap();
/// assert!(store.get("tags", "7").await.unwrap().is_some());
/// assert_eq!(store.write_count(), 1);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
    writes: AtomicU64,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a document directly, bypassing the write counter.
    ///
    /// Useful for seeding fixtures.
    pub fn seed(&self, collection: &str, id: impl Into<String>, document: Document) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.into(), document);
    }

    /// Returns the number of successful `put` calls.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Returns the number of documents in a collection.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Returns true if the collection holds no documents.
    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Document>> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn get_all(&self, collection: &str) -> StorageResult<Vec<StoredDocument>> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, doc)| StoredDocument::new(id.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn put(&self, collection: &str, id: &str, document: Document) -> StorageResult<()> {
        self.seed(collection, id, document);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duastore_codec::Value;

    fn doc(name: &str) -> Document {
        let mut doc = Document::new();
        doc.insert("name".into(), Value::from(name));
        doc
    }

    #[tokio::test]
    async fn memory_new_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.is_empty("tags"));
        assert_eq!(store.write_count(), 0);
        assert!(store.get_all("tags").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn memory_get_missing_is_none() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("tags", "nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_put_replaces_whole_document() {
        let store = InMemoryStore::new();
        let mut first = doc("Fasting");
        first.insert("extra".into(), Value::Bool(true));
        store.put("tags", "7", first).await.unwrap();
        store.put("tags", "7", doc("Prayer")).await.unwrap();

        assert_eq!(store.get("tags", "7").await.unwrap(), Some(doc("Prayer")));
        assert_eq!(store.len("tags"), 1);
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn memory_collections_are_independent() {
        let store = InMemoryStore::new();
        store.put("tags", "1", doc("a")).await.unwrap();
        store.put("duas", "1", doc("b")).await.unwrap();

        assert_eq!(store.get("tags", "1").await.unwrap(), Some(doc("a")));
        assert_eq!(store.get("duas", "1").await.unwrap(), Some(doc("b")));
        assert_eq!(store.get("themes", "1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_seed_does_not_count_as_write() {
        let store = InMemoryStore::new();
        store.seed("setting", "admin", doc("x"));
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.get_all("setting").await.unwrap().len(), 1);
    }
}
