//! Allow-list commands: grant, check.

use super::{open_server, CliResult};
use duastore_core::AllowList;
use duastore_protocol::{VerifyAuthorityRequest, VerifyAuthorityResponse};
use duastore_server::ServerConfig;
use duastore_storage::FileStore;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Adds an email to the admin allow-list. Returns false if already listed.
pub async fn grant(path: &Path, email: &str) -> CliResult<bool> {
    let store = FileStore::open(path).await?;
    let added = AllowList::new(Arc::new(store)).grant(email).await?;
    if !added {
        info!(email, "already on the allow-list");
    }
    Ok(added)
}

/// Checks whether an email is on the allow-list.
pub async fn check(path: &Path, email: &str) -> CliResult<VerifyAuthorityResponse> {
    let server = open_server(path, ServerConfig::default()).await?;
    Ok(server
        .handler()
        .handle_verify_authority(VerifyAuthorityRequest::email(email))
        .await?)
}
