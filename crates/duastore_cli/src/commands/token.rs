//! Identity token commands: issue-token, verify.

use super::{open_server, CliResult};
use duastore_codec::Document;
use duastore_protocol::{VerifyAuthorityRequest, VerifyAuthorityResponse};
use duastore_server::{AuthConfig, HmacTokenVerifier, ServerConfig};
use std::path::Path;
use std::time::Duration;

/// Issues a signed token for `email`, with optional extra claims as JSON.
pub fn issue(secret: &str, email: &str, claims: Option<&str>) -> CliResult<String> {
    let extra: Document = match claims {
        Some(json) => serde_json::from_str(json)?,
        None => Document::new(),
    };
    let verifier = HmacTokenVerifier::new(AuthConfig::new(secret.as_bytes().to_vec()));
    Ok(verifier.issue(email, extra)?)
}

/// Verifies a token and checks its email against the allow-list.
pub async fn verify(
    path: &Path,
    secret: &str,
    token: &str,
    expiry: Duration,
) -> CliResult<VerifyAuthorityResponse> {
    let config = ServerConfig::default()
        .with_auth(secret.as_bytes().to_vec())
        .with_token_expiry(expiry);
    let server = open_server(path, config).await?;
    Ok(server
        .handler()
        .handle_verify_authority(VerifyAuthorityRequest::token(token))
        .await?)
}
