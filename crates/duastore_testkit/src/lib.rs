//! # duastore testkit
//!
//! Test utilities for duastore.
//!
//! This crate provides:
//! - Record and settings fixtures
//! - Temporary on-disk stores
//! - [`FlakyStore`], a store wrapper that fails chosen reads and writes
//! - Property-based generators for values and record payloads
//!
//! ## Usage
//!
//! ```
//! use duastore_core::{Collection, EngineConfig, UpsertEngine};
//! use duastore_testkit::prelude::*;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = Arc::new(FlakyStore::new());
//! store.fail_reads_of("2");
//!
//! let engine = UpsertEngine::new(store.clone(), Arc::new(fixed_clock()), EngineConfig::default());
//! let outcomes = engine
//!     .upsert_all(Collection::Tags, vec![record(1, "a"), record(2, "b")])
//!     .await
//!     .unwrap();
//! assert!(outcomes[0].stored().is_some());
//! assert!(outcomes[1].is_failed());
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faults::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use faults::*;
pub use fixtures::*;
pub use generators::*;
