//! Server configuration.

use crate::auth::AuthConfig;
use duastore_core::EngineConfig;
use std::time::Duration;

/// Default lifetime of identity tokens.
pub const DEFAULT_TOKEN_EXPIRY: Duration = Duration::from_secs(60 * 60);

/// Configuration for the content server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Upsert engine settings.
    pub engine: EngineConfig,
    /// Lifetime of identity tokens.
    pub token_expiry: Duration,
    /// Secret key for token verification. Without one, token checks fail.
    pub auth_secret: Option<Vec<u8>>,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new() -> Self {
        Self {
            engine: EngineConfig::default(),
            token_expiry: DEFAULT_TOKEN_EXPIRY,
            auth_secret: None,
        }
    }

    /// Sets the upsert engine settings.
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Sets the token lifetime.
    pub fn with_token_expiry(mut self, expiry: Duration) -> Self {
        self.token_expiry = expiry;
        self
    }

    /// Enables token verification with the given secret.
    pub fn with_auth(mut self, secret: Vec<u8>) -> Self {
        self.auth_secret = Some(secret);
        self
    }

    /// Returns the token settings, if a secret is configured.
    pub fn auth_config(&self) -> Option<AuthConfig> {
        self.auth_secret
            .clone()
            .map(|secret| AuthConfig::new(secret).with_expiry(self.token_expiry))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duastore_core::BatchPolicy;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.token_expiry, Duration::from_secs(3600));
        assert!(config.auth_secret.is_none());
        assert!(config.auth_config().is_none());
    }

    #[test]
    fn config_builder() {
        let config = ServerConfig::new()
            .with_engine(EngineConfig::new().with_batch_policy(BatchPolicy::InsertUnidentified))
            .with_token_expiry(Duration::from_secs(60))
            .with_auth(vec![1, 2, 3, 4]);

        assert_eq!(config.engine.batch_policy, BatchPolicy::InsertUnidentified);
        let auth = config.auth_config().unwrap();
        assert_eq!(auth.secret, vec![1, 2, 3, 4]);
        assert_eq!(auth.token_expiry, Duration::from_secs(60));
    }
}
