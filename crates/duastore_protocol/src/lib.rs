//! # duastore protocol
//!
//! Wire messages for the duastore content API.
//!
//! This crate provides:
//! - [`Request`] and [`Response`] envelopes for the five operations
//! - Typed bodies for authority checks and update checks
//! - [`ItemOutcome`] for per-record batch results
//! - JSON encoding/decoding
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod messages;

pub use error::{ProtocolError, ProtocolResult};
pub use messages::{
    CheckUpdatesRequest, CheckUpdatesResponse, ErrorResponse, ItemOutcome, RecordList, Request,
    Response, VerifyAuthorityRequest, VerifyAuthorityResponse,
};
