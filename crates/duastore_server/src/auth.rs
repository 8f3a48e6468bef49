//! Identity token verification.
//!
//! This module provides signed identity tokens using HMAC-SHA256.
//! Tokens carry an issue time for expiration checking.
//!
//! ## Token Format
//!
//! `<payload>.<signature>` where:
//! - payload: hex of the JSON claims object (`email`, `iat` in Unix millis,
//!   plus any extra claims)
//! - signature: hex of the HMAC-SHA256 of the payload text

use crate::error::{ServerError, ServerResult};
use duastore_codec::{Document, Value};
use duastore_core::{Clock, SystemClock};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Decoded token claims.
pub type Claims = Document;

/// Claim naming the token subject.
pub const EMAIL_CLAIM: &str = "email";

/// Claim holding the issue time in Unix millis.
pub const ISSUED_AT_CLAIM: &str = "iat";

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret key for HMAC.
    pub secret: Vec<u8>,
    /// Token expiration duration.
    pub token_expiry: Duration,
}

impl AuthConfig {
    /// Creates a new auth configuration.
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret,
            token_expiry: Duration::from_secs(60 * 60),
        }
    }

    /// Sets the token expiration duration.
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.token_expiry = expiry;
        self
    }
}

/// Turns an identity token into its claims.
pub trait TokenVerifier: Send + Sync {
    /// Verifies a token and returns its claims.
    ///
    /// The claims always contain a text `email`.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::AuthenticationFailed` for malformed, forged or
    /// expired tokens.
    fn verify(&self, token: &str) -> ServerResult<Claims>;
}

/// Issues and verifies HMAC-signed identity tokens.
#[derive(Clone)]
pub struct HmacTokenVerifier {
    config: AuthConfig,
    clock: Arc<dyn Clock>,
}

impl HmacTokenVerifier {
    /// Creates a verifier using the wall clock.
    pub fn new(config: AuthConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a verifier reading time from `clock`.
    pub fn with_clock(config: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    /// Issues a token for `email`, carrying `extra` claims alongside.
    ///
    /// `email` and `iat` always override same-named extras.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be serialized.
    pub fn issue(&self, email: &str, extra: Document) -> ServerResult<String> {
        let mut claims = extra;
        claims.insert(EMAIL_CLAIM.to_string(), Value::from(email));
        claims.insert(
            ISSUED_AT_CLAIM.to_string(),
            Value::Integer(i64::try_from(self.clock.now_millis()).unwrap_or(i64::MAX)),
        );

        let json = serde_json::to_vec(&claims)
            .map_err(|e| ServerError::Internal(format!("cannot encode claims: {e}")))?;
        let payload = hex::encode(json);
        let signature = hex::encode(self.mac(&payload)?.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    fn mac(&self, payload: &str) -> ServerResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.config.secret)
            .map_err(|e| ServerError::Internal(format!("bad HMAC key: {e}")))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    fn reject(reason: &str) -> ServerError {
        warn!(reason, "rejected identity token");
        ServerError::AuthenticationFailed(reason.to_string())
    }
}

impl TokenVerifier for HmacTokenVerifier {
    fn verify(&self, token: &str) -> ServerResult<Claims> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| Self::reject("malformed token"))?;
        let signature = hex::decode(signature).map_err(|_| Self::reject("malformed signature"))?;

        // verify_slice compares in constant time
        self.mac(payload)?
            .verify_slice(&signature)
            .map_err(|_| Self::reject("invalid signature"))?;

        let json = hex::decode(payload).map_err(|_| Self::reject("malformed payload"))?;
        let claims: Claims =
            serde_json::from_slice(&json).map_err(|_| Self::reject("malformed claims"))?;

        if claims.get(EMAIL_CLAIM).and_then(Value::as_text).is_none() {
            return Err(Self::reject("missing email claim"));
        }
        let issued_at = claims
            .get(ISSUED_AT_CLAIM)
            .and_then(Value::as_integer)
            .and_then(|v| u64::try_from(v).ok())
            .ok_or_else(|| Self::reject("missing issue time"))?;

        let expiry_millis = u64::try_from(self.config.token_expiry.as_millis()).unwrap_or(u64::MAX);
        if self.clock.now_millis() > issued_at.saturating_add(expiry_millis) {
            return Err(Self::reject("token expired"));
        }

        Ok(claims)
    }
}
