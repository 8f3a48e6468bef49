//! Main content server.

use crate::auth::{HmacTokenVerifier, TokenVerifier};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{HandlerContext, RequestHandler};
use duastore_core::{Clock, SystemClock};
use duastore_protocol::{ErrorResponse, Request, Response};
use duastore_storage::DocumentStore;
use std::sync::Arc;
use tracing::{error, warn};

/// The content server.
///
/// Transport-agnostic: decode a [`Request`] however it arrives, pass it to
/// [`ContentServer::handle_message`], and send back the [`Response`].
///
/// # Example
///
/// ```
/// use duastore_protocol::{Request, Response};
/// use duastore_server::{ContentServer, ServerConfig};
/// use duastore_storage::InMemoryStore;
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let server = ContentServer::new(Arc::new(InMemoryStore::new()), ServerConfig::default());
///
/// let response = server
///     .handle_message(Request::Open { collection: "tags".into() })
///     .await;
/// assert_eq!(response, Response::Open(vec![]));
/// # }
/// ```
pub struct ContentServer {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
}

impl ContentServer {
    /// Creates a server using the wall clock.
    ///
    /// Identity tokens are accepted only if the config carries a secret.
    pub fn new(store: Arc<dyn DocumentStore>, config: ServerConfig) -> Self {
        Self::with_clock(store, Arc::new(SystemClock), config)
    }

    /// Creates a server reading time from `clock`.
    pub fn with_clock(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        config: ServerConfig,
    ) -> Self {
        let verifier = config.auth_config().map(|auth| {
            Arc::new(HmacTokenVerifier::with_clock(auth, clock.clone())) as Arc<dyn TokenVerifier>
        });
        Self::with_verifier(store, clock, config, verifier)
    }

    /// Creates a server with a custom token verifier.
    pub fn with_verifier(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        config: ServerConfig,
        verifier: Option<Arc<dyn TokenVerifier>>,
    ) -> Self {
        let context = Arc::new(HandlerContext::new(config, store, clock, verifier));
        let handler = RequestHandler::new(Arc::clone(&context));
        Self { handler, context }
    }

    /// Returns the request handler.
    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.context.config
    }

    /// Handles a request, turning failures into error responses.
    pub async fn handle_message(&self, request: Request) -> Response {
        let operation = request.operation();
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(err) => {
                if err.is_server_error() {
                    error!(operation, error = %err, "request failed");
                } else {
                    warn!(operation, error = %err, "request rejected");
                }
                Response::Error(ErrorResponse::new(err.status_code(), err.to_string()))
            }
        }
    }

    /// Handles a JSON-encoded request and returns the JSON-encoded response.
    ///
    /// # Errors
    ///
    /// Returns an error only if the response cannot be encoded. Malformed
    /// requests produce an encoded error response.
    pub async fn handle_json(&self, bytes: &[u8]) -> ServerResult<Vec<u8>> {
        let response = match Request::decode(bytes) {
            Ok(request) => self.handle_message(request).await,
            Err(err) => {
                warn!(error = %err, "undecodable request");
                let err = ServerError::InvalidRequest(err.to_string());
                Response::Error(ErrorResponse::new(err.status_code(), err.to_string()))
            }
        };
        response
            .encode()
            .map_err(|e| ServerError::Internal(format!("cannot encode response: {e}")))
    }

    async fn dispatch(&self, request: Request) -> ServerResult<Response> {
        Ok(match request {
            Request::VerifyAuthority(req) => {
                Response::VerifyAuthority(self.handler.handle_verify_authority(req).await?)
            }
            Request::CheckUpdates(req) => {
                Response::CheckUpdates(self.handler.handle_check_updates(req).await?)
            }
            Request::Open { collection } => {
                Response::Open(self.handler.handle_open(&collection).await?)
            }
            Request::Set { collection, record } => {
                Response::Set(self.handler.handle_set(&collection, record).await?)
            }
            Request::SetAll {
                collection,
                records,
            } => Response::SetAll(self.handler.handle_set_all(&collection, records).await?),
        })
    }
}
