//! Document store trait definition.

use crate::error::StorageResult;
use async_trait::async_trait;
use duastore_codec::Document;
use std::sync::Arc;

/// A document together with the id it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Document id, unique within its collection.
    pub id: String,
    /// Document fields.
    pub document: Document,
}

impl StoredDocument {
    /// Creates a new stored document.
    pub fn new(id: impl Into<String>, document: Document) -> Self {
        Self {
            id: id.into(),
            document,
        }
    }
}

/// A durable key-value document store, scoped by collection name.
///
/// Stores are **opaque**: they do not interpret document fields. Version
/// stamps, identity rules and change detection live above this layer.
///
/// # Invariants
///
/// - `get` returns exactly the document last passed to `put` for that id,
///   or `None` if nothing was ever written
/// - `put` fully replaces the document; there are no partial patches
/// - `put` is durable when it returns
/// - Reading an absent collection is not an error: `get_all` returns an
///   empty list
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing and ephemeral use
/// - [`super::FileStore`] - One file per document on the local file system
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches one document by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read. An absent document is
    /// `Ok(None)`.
    async fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Document>>;

    /// Fetches every document in a collection.
    ///
    /// Order is unspecified.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn get_all(&self, collection: &str) -> StorageResult<Vec<StoredDocument>>;

    /// Replaces the document stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be made durable.
    async fn put(&self, collection: &str, id: &str, document: Document) -> StorageResult<()>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Document>> {
        (**self).get(collection, id).await
    }

    async fn get_all(&self, collection: &str) -> StorageResult<Vec<StoredDocument>> {
        (**self).get_all(collection).await
    }

    async fn put(&self, collection: &str, id: &str, document: Document) -> StorageResult<()> {
        (**self).put(collection, id, document).await
    }
}
