//! File-based document store for persistent storage.

use crate::error::{StorageError, StorageResult};
use crate::store::{DocumentStore, StoredDocument};
use async_trait::async_trait;
use duastore_codec::{decode_document, encode_document, Document, Value};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const DOCUMENT_EXT: &str = "cbor";
const ENVELOPE_ID: &str = "id";
const ENVELOPE_DOC: &str = "doc";

/// A document store backed by the local file system.
///
/// Layout:
///
/// ```text
/// <root>/<collection>/<hex(sha256(id))>.cbor
/// ```
///
/// File names are fixed-length digests, so ids of any length or content
/// map to valid file names. Each file holds one canonical CBOR envelope
/// `{ "id": <id>, "doc": <document> }`; the id is read back from the
/// envelope, never from the file name.
///
/// # Durability
///
/// `put` writes to a temporary file, calls `sync_all`, then renames it
/// over the target. A crash leaves either the old or the new document,
/// never a torn one. A failed write removes its temporary file.
///
/// # Example
///
/// ```no_run
/// use duastore_storage::FileStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = FileStore::open("data").await.unwrap();
/// # }
/// ```
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

impl FileStore {
    /// Opens or creates a file store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub async fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            tmp_counter: AtomicU64::new(0),
        })
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> StorageResult<PathBuf> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidCollection(collection.to_string()));
        }
        Ok(self.root.join(collection))
    }

    fn document_path(&self, collection: &str, id: &str) -> StorageResult<PathBuf> {
        let digest = Sha256::digest(id.as_bytes());
        let file_name = format!("{}.{DOCUMENT_EXT}", hex::encode(digest));
        Ok(self.collection_dir(collection)?.join(file_name))
    }

    fn is_document_path(path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(DOCUMENT_EXT)
    }

    fn seal(id: &str, document: Document) -> StorageResult<Vec<u8>> {
        let mut envelope = Document::new();
        envelope.insert(ENVELOPE_ID.to_string(), Value::from(id));
        envelope.insert(ENVELOPE_DOC.to_string(), Value::Map(document));
        Ok(encode_document(&envelope)?)
    }

    /// Decodes an envelope into its id and document.
    fn open_envelope(bytes: &[u8]) -> Result<(String, Document), String> {
        let mut envelope = decode_document(bytes).map_err(|e| e.to_string())?;
        let id = match envelope.remove(ENVELOPE_ID) {
            Some(Value::Text(id)) => id,
            _ => return Err("envelope has no text id".to_string()),
        };
        let document = match envelope.remove(ENVELOPE_DOC) {
            Some(Value::Map(document)) => document,
            _ => return Err(format!("envelope for {id:?} has no document")),
        };
        Ok((id, document))
    }
}

/// Writes `bytes` to a fresh file at `path` and syncs it.
///
/// The file is removed again if any step fails.
async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let result = async {
        let mut file = fs::File::create(path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await
    }
    .await;
    if result.is_err() {
        let _ = fs::remove_file(path).await;
    }
    result
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Document>> {
        let path = self.document_path(collection, id)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let (stored_id, document) = Self::open_envelope(&bytes)
            .map_err(|e| StorageError::Corrupted(format!("{collection}/{id}: {e}")))?;
        if stored_id != id {
            warn!(collection, id, stored_id = %stored_id, "document id mismatch");
            return Err(StorageError::Corrupted(format!(
                "{collection}/{id}: file holds id {stored_id:?}"
            )));
        }
        Ok(Some(document))
    }

    async fn get_all(&self, collection: &str) -> StorageResult<Vec<StoredDocument>> {
        let dir = self.collection_dir(collection)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !Self::is_document_path(&path) {
                debug!(path = %path.display(), "skipping non-document file");
                continue;
            }
            let bytes = fs::read(&path).await?;
            let (id, document) = Self::open_envelope(&bytes).map_err(|e| {
                warn!(collection, path = %path.display(), error = %e, "undecodable document");
                StorageError::Corrupted(format!("{collection}/{}: {e}", path.display()))
            })?;
            documents.push(StoredDocument::new(id, document));
        }
        Ok(documents)
    }

    async fn put(&self, collection: &str, id: &str, document: Document) -> StorageResult<()> {
        let path = self.document_path(collection, id)?;
        let bytes = Self::seal(id, document)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let tmp_path = path.with_extension(format!("{DOCUMENT_EXT}.{n}.tmp"));

        write_synced(&tmp_path, &bytes).await?;

        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!(collection, id, bytes = bytes.len(), "document written");
        Ok(())
    }
}
