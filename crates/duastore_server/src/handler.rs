//! Request handlers for the content operations.

use crate::auth::{TokenVerifier, EMAIL_CLAIM};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use duastore_codec::{Document, Value};
use duastore_core::{
    AllowList, BatchOutcome, Clock, Collection, DeltaFeed, Record, UpsertEngine,
};
use duastore_protocol::{
    CheckUpdatesRequest, CheckUpdatesResponse, ItemOutcome, RecordList, VerifyAuthorityRequest,
    VerifyAuthorityResponse,
};
use duastore_storage::DocumentStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared state for request handling.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Write path.
    pub engine: UpsertEngine,
    /// Read path.
    pub feed: DeltaFeed,
    /// Admin allow-list.
    pub gate: AllowList,
    verifier: Option<Arc<dyn TokenVerifier>>,
}

impl HandlerContext {
    /// Creates a handler context over one store.
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        verifier: Option<Arc<dyn TokenVerifier>>,
    ) -> Self {
        Self {
            engine: UpsertEngine::new(store.clone(), clock, config.engine.clone()),
            feed: DeltaFeed::new(store.clone()),
            gate: AllowList::new(store),
            config,
            verifier,
        }
    }
}

/// Handler for content requests.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Decides whether the caller may edit content.
    ///
    /// A token, when given, is checked instead of the plain email. A token
    /// that fails verification is an error, never a silent refusal.
    pub async fn handle_verify_authority(
        &self,
        request: VerifyAuthorityRequest,
    ) -> ServerResult<VerifyAuthorityResponse> {
        if let Some(token) = non_empty(request.identity_token.as_deref()) {
            let verifier = self.context.verifier.as_ref().ok_or_else(|| {
                ServerError::NotAuthorized("identity tokens are not accepted here".into())
            })?;
            let claims = verifier.verify(token)?;
            let email = claims
                .get(EMAIL_CLAIM)
                .and_then(Value::as_text)
                .ok_or_else(|| ServerError::AuthenticationFailed("missing email claim".into()))?;
            if self.context.gate.check_authority(email).await? {
                info!(email, "granted authority by token");
                return Ok(VerifyAuthorityResponse::granted(claims));
            }
            return Ok(VerifyAuthorityResponse::denied());
        }

        if let Some(email) = non_empty(request.email.as_deref()) {
            let allowed = self.context.gate.check_authority(email).await?;
            return Ok(VerifyAuthorityResponse::decided(allowed));
        }

        Ok(VerifyAuthorityResponse::denied())
    }

    /// Returns records of every collection changed after the watermark.
    pub async fn handle_check_updates(
        &self,
        request: CheckUpdatesRequest,
    ) -> ServerResult<CheckUpdatesResponse> {
        let mut delta = self
            .context
            .feed
            .delta(&Collection::ALL, request.timestamp)
            .await?;
        let mut take = |collection: Collection| -> RecordList {
            delta
                .remove(&collection)
                .unwrap_or_default()
                .into_iter()
                .map(|record| record.into_wire())
                .collect()
        };
        let response = CheckUpdatesResponse {
            tags: take(Collection::Tags),
            duas: take(Collection::Duas),
            themes: take(Collection::Themes),
        };
        debug!(since = ?request.timestamp, count = response.len(), "served update check");
        Ok(response)
    }

    /// Returns every record of a collection, without versions.
    pub async fn handle_open(&self, collection: &str) -> ServerResult<RecordList> {
        let collection = parse_collection(collection)?;
        let records = self.context.feed.open(collection).await?;
        Ok(records.into_iter().map(Record::into_wire).collect())
    }

    /// Upserts one record and returns it without version.
    pub async fn handle_set(&self, collection: &str, record: Document) -> ServerResult<Document> {
        let collection = parse_collection(collection)?;
        let result = self.context.engine.upsert(collection, record).await?;
        Ok(result.record.into_record().into_wire())
    }

    /// Upserts many records, reporting one outcome per record.
    pub async fn handle_set_all(
        &self,
        collection: &str,
        records: RecordList,
    ) -> ServerResult<Vec<ItemOutcome>> {
        let collection = parse_collection(collection)?;
        let outcomes = self.context.engine.upsert_all(collection, records).await?;
        Ok(outcomes.into_iter().map(item_outcome).collect())
    }
}

fn parse_collection(name: &str) -> ServerResult<Collection> {
    Ok(name.parse::<Collection>()?)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn item_outcome(outcome: BatchOutcome) -> ItemOutcome {
    match outcome {
        BatchOutcome::Stored(result) => ItemOutcome::Stored {
            record: result.record.into_record().into_wire(),
        },
        BatchOutcome::Skipped => ItemOutcome::Skipped,
        BatchOutcome::Failed(error) => ItemOutcome::Failed {
            error: error.to_string(),
        },
    }
}
