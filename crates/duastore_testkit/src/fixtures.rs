//! Record fixtures and store helpers.

use duastore_codec::{Document, Value};
use duastore_core::{ManualClock, ADMIN_DOCUMENT_ID, ADMIN_EMAIL_FIELD, SETTINGS_COLLECTION};
use duastore_storage::{FileStore, InMemoryStore};
use std::path::Path;
use tempfile::TempDir;

/// Epoch millis the fixture clock starts at (2023-11-14T22:13:20Z).
pub const FIXED_NOW: u64 = 1_700_000_000_000;

/// Returns a manual clock reading [`FIXED_NOW`].
pub fn fixed_clock() -> ManualClock {
    ManualClock::new(FIXED_NOW)
}

/// Builds a document from key/value pairs.
pub fn document<K, V, I>(pairs: I) -> Document
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A tag-style payload `{"id": id, "name": name}`.
pub fn record(id: i64, name: &str) -> Document {
    document([("id", Value::from(id)), ("name", Value::from(name))])
}

/// A payload with content only, no id.
pub fn unidentified(name: &str) -> Document {
    document([("name", name)])
}

/// The admin settings document listing `emails`.
pub fn admin_settings(emails: &[&str]) -> Document {
    document([(ADMIN_EMAIL_FIELD, Value::from(emails.to_vec()))])
}

/// Returns an in-memory store with the admin allow-list seeded.
pub fn store_with_admins(emails: &[&str]) -> InMemoryStore {
    let store = InMemoryStore::new();
    store.seed(SETTINGS_COLLECTION, ADMIN_DOCUMENT_ID, admin_settings(emails));
    store
}

/// A file store in a temporary directory, removed on drop.
pub struct TestFileStore {
    /// The store instance.
    pub store: FileStore,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestFileStore {
    /// Creates a file store in a fresh temporary directory.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::open(temp_dir.path())
            .await
            .expect("Failed to open file store");
        Self {
            store,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the store root.
    pub fn path(&self) -> &Path {
        self.store.root()
    }
}

impl std::ops::Deref for TestFileStore {
    type Target = FileStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}
