//! Record commands: open, set, set-all, updates.

use super::{open_server, CliResult};
use duastore_codec::Document;
use duastore_core::{BatchPolicy, EngineConfig};
use duastore_protocol::{CheckUpdatesRequest, CheckUpdatesResponse, ItemOutcome, RecordList};
use duastore_server::ServerConfig;
use std::path::Path;
use tracing::info;

/// Lists every record of a collection.
pub async fn open(path: &Path, collection: &str) -> CliResult<RecordList> {
    let server = open_server(path, ServerConfig::default()).await?;
    Ok(server.handler().handle_open(collection).await?)
}

/// Upserts one record given as a JSON object.
pub async fn set(path: &Path, collection: &str, json: &str) -> CliResult<Document> {
    let record: Document = serde_json::from_str(json)?;
    let server = open_server(path, ServerConfig::default()).await?;
    let stored = server.handler().handle_set(collection, record).await?;
    info!(collection, "record saved");
    Ok(stored)
}

/// Upserts records given as a JSON array.
pub async fn set_all(
    path: &Path,
    collection: &str,
    json: &str,
    policy: BatchPolicy,
) -> CliResult<Vec<ItemOutcome>> {
    let records: RecordList = serde_json::from_str(json)?;
    let config = ServerConfig::default().with_engine(EngineConfig::new().with_batch_policy(policy));
    let server = open_server(path, config).await?;
    let outcomes = server.handler().handle_set_all(collection, records).await?;
    let failed = outcomes
        .iter()
        .filter(|o| matches!(o, ItemOutcome::Failed { .. }))
        .count();
    info!(collection, total = outcomes.len(), failed, "batch saved");
    Ok(outcomes)
}

/// Lists records of every collection changed after `since`.
pub async fn updates(path: &Path, since: Option<u64>) -> CliResult<CheckUpdatesResponse> {
    let server = open_server(path, ServerConfig::default()).await?;
    let request = CheckUpdatesRequest { timestamp: since };
    Ok(server.handler().handle_check_updates(request).await?)
}
