//! Command implementations.
//!
//! Every command opens the file store at `--path` and goes through the same
//! handlers the server uses, so CLI writes follow the same upsert rules.

pub mod admin;
pub mod records;
pub mod token;

use duastore_server::{ContentServer, ServerConfig};
use duastore_storage::FileStore;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Result type for commands.
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Opens a content server over the file store at `path`.
pub async fn open_server(path: &Path, config: ServerConfig) -> CliResult<ContentServer> {
    let store = FileStore::open(path).await?;
    Ok(ContentServer::new(Arc::new(store), config))
}

/// Prints a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
