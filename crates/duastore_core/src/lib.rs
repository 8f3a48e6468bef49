//! # duastore core
//!
//! Change-aware writes and incremental reads over the duastore collections.
//!
//! This crate provides:
//! - [`UpsertEngine`] - inserts, updates or skips records depending on
//!   whether their content changed, stamping a fresh `version` on change
//! - [`DeltaFeed`] - full snapshots and "changed since" reads driven by a
//!   client-held watermark
//! - [`AllowList`] - the admin email allow-list check
//!
//! ## Versions
//!
//! A record's `version` is the epoch-millisecond time its content last
//! changed. Rewriting identical content never touches the store, so
//! clients polling with a watermark only see real changes.
//!
//! ## Usage
//!
//! ```
//! use duastore_codec::{Document, Value};
//! use duastore_core::{Collection, DeltaFeed, EngineConfig, ManualClock, UpsertEngine, WriteKind};
//! use duastore_storage::InMemoryStore;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = Arc::new(InMemoryStore::new());
//! let clock = Arc::new(ManualClock::new(1_000));
//! let engine = UpsertEngine::new(store.clone(), clock, EngineConfig::default());
//!
//! let mut tag = Document::new();
//! tag.insert("id".into(), Value::from(7));
//! tag.insert("name".into(), Value::from("Fasting"));
//!
//! let first = engine.upsert(Collection::Tags, tag.clone()).await.unwrap();
//! let again = engine.upsert(Collection::Tags, tag).await.unwrap();
//! assert_eq!(first.kind, WriteKind::Inserted);
//! assert_eq!(again.kind, WriteKind::Unchanged);
//!
//! let feed = DeltaFeed::new(store);
//! assert!(feed.changes_since(Collection::Tags, Some(1_000)).await.unwrap().is_empty());
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod clock;
mod collection;
mod config;
mod error;
mod feed;
mod gate;
mod record;
mod upsert;

pub use clock::{Clock, ManualClock, SystemClock};
pub use collection::{Collection, ADMIN_DOCUMENT_ID, ADMIN_EMAIL_FIELD, SETTINGS_COLLECTION};
pub use config::{BatchPolicy, EngineConfig};
pub use error::{CoreError, CoreResult};
pub use feed::{Delta, DeltaFeed};
pub use gate::AllowList;
pub use record::{IncomingRecord, Record, StoredRecord, ID_FIELD, VERSION_FIELD};
pub use upsert::{BatchOutcome, UpsertEngine, UpsertResult, WriteKind};
