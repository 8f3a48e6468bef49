//! # duastore codec
//!
//! Dynamic record values for duastore.
//!
//! This crate provides:
//! - [`Value`], a tagged union over the JSON data model, and [`Document`],
//!   the field map every record is stored as
//! - Structural deep equality ([`is_same`], [`documents_equal`]) used to
//!   detect whether a write changes a record
//! - Deterministic CBOR encoding of documents for on-disk storage
//! - serde support, so values travel as plain JSON on the wire
//!
//! ## Usage
//!
//! ```
//! use duastore_codec::{decode_document, encode_document, Document, Value};
//!
//! let mut doc = Document::new();
//! doc.insert("name".into(), Value::from("Fasting"));
//!
//! let bytes = encode_document(&doc).unwrap();
//! assert_eq!(decode_document(&bytes).unwrap(), doc);
//! assert!(Value::Integer(1).is_same(&Value::Float(1.0)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod decoder;
mod encoder;
mod equality;
mod error;
mod value;

pub use decoder::{decode_document, from_cbor, CanonicalDecoder};
pub use encoder::{encode_document, to_canonical_cbor, CanonicalEncoder};
pub use equality::{documents_equal, is_same};
pub use error::{CodecError, CodecResult};
pub use value::{Document, Value};
