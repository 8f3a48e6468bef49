//! # duastore storage
//!
//! Document store trait and implementations for duastore.
//!
//! This crate is the lowest-level storage abstraction. A store is a set of
//! named collections, each a key-value mapping from string id to
//! [`Document`](duastore_codec::Document).
//!
//! ## Design Principles
//!
//! - Stores do not interpret document fields
//! - Every write is a full-document replace, durable on return
//! - Reads of absent documents or collections are not errors
//! - Stores are `Send + Sync` and async, so one handle serves many
//!   concurrent requests
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral storage
//! - [`FileStore`] - One CBOR file per document on disk

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use store::{DocumentStore, StoredDocument};
