//! Fault injection for document stores.
//!
//! [`FlakyStore`] wraps an [`InMemoryStore`] and fails the operations a test
//! picks, so error isolation can be exercised without real I/O failures.

use async_trait::async_trait;
use duastore_codec::Document;
use duastore_storage::{DocumentStore, InMemoryStore, StorageError, StorageResult, StoredDocument};
use parking_lot::Mutex;
use std::collections::HashSet;

/// A store that fails chosen operations with `StorageError::Unavailable`.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: InMemoryStore,
    faults: Mutex<Faults>,
}

#[derive(Debug, Default)]
struct Faults {
    reads: HashSet<String>,
    writes: HashSet<String>,
    listings: HashSet<String>,
}

impl FlakyStore {
    /// Creates an empty store with no faults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    /// Fails every read of documents with this id, in any collection.
    pub fn fail_reads_of(&self, id: impl Into<String>) {
        self.faults.lock().reads.insert(id.into());
    }

    /// Fails every write of documents with this id, in any collection.
    pub fn fail_writes_of(&self, id: impl Into<String>) {
        self.faults.lock().writes.insert(id.into());
    }

    /// Fails listing this collection.
    pub fn fail_listing_of(&self, collection: impl Into<String>) {
        self.faults.lock().listings.insert(collection.into());
    }

    /// Clears every fault.
    pub fn heal(&self) {
        *self.faults.lock() = Faults::default();
    }
}

fn injected(what: &str, key: &str) -> StorageError {
    StorageError::Unavailable(format!("injected {what} failure for {key:?}"))
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Document>> {
        if self.faults.lock().reads.contains(id) {
            return Err(injected("read", id));
        }
        self.inner.get(collection, id).await
    }

    async fn get_all(&self, collection: &str) -> StorageResult<Vec<StoredDocument>> {
        if self.faults.lock().listings.contains(collection) {
            return Err(injected("listing", collection));
        }
        self.inner.get_all(collection).await
    }

    async fn put(&self, collection: &str, id: &str, document: Document) -> StorageResult<()> {
        if self.faults.lock().writes.contains(id) {
            return Err(injected("write", id));
        }
        self.inner.put(collection, id, document).await
    }
}
