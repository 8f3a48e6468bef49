//! # duastore server
//!
//! Request handling for the duastore content API.
//!
//! This crate provides:
//! - Handlers for the five content operations (verify authority, check
//!   updates, open, set, set all)
//! - Identity tokens signed with HMAC-SHA256
//! - A transport-agnostic [`ContentServer`] that maps failures to error
//!   responses
//!
//! # Authentication
//!
//! Token checks are enabled by configuring a secret:
//!
//! ```
//! use duastore_codec::Document;
//! use duastore_server::{AuthConfig, HmacTokenVerifier, ServerConfig, TokenVerifier};
//!
//! let secret = b"my-secure-secret-32-bytes-long!".to_vec();
//! let config = ServerConfig::default().with_auth(secret.clone());
//!
//! let verifier = HmacTokenVerifier::new(AuthConfig::new(secret));
//! let token = verifier.issue("editor@example.com", Document::new()).unwrap();
//! assert!(verifier.verify(&token).is_ok());
//! # let _ = config;
//! ```
//!
//! # Writes
//!
//! Writes go through the change-aware upsert engine: rewriting identical
//! content stores nothing and publishes nothing to update checks.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod auth;
mod config;
mod error;
mod handler;
mod server;

pub use auth::{AuthConfig, Claims, HmacTokenVerifier, TokenVerifier, EMAIL_CLAIM, ISSUED_AT_CLAIM};
pub use config::{ServerConfig, DEFAULT_TOKEN_EXPIRY};
pub use error::{ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler};
pub use server::ContentServer;
