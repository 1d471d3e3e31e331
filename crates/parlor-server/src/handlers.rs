//! HTTP handlers for the Parlor server.
//!
//! This module maps requests onto presence and message operations and
//! translates their errors into status codes.

use crate::config::Config;
use crate::metrics;
use anyhow::Result;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parlor_core::{
    parse_limit, ChatError, MemoryStore, Message, MessageDraft, MessageRouter, Participant,
    PresenceManager, Store, SweepScheduler,
};
use parlor_protocol::{ErrorBody, MessagesQuery, PostMessageRequest, RegisterRequest, USER_HEADER};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

/// Shared server state.
pub struct AppState {
    /// Participant lifecycle.
    pub presence: PresenceManager,
    /// Message validation and visibility.
    pub router: MessageRouter,
    /// Server configuration.
    pub config: Config,
}

impl AppState {
    /// Create new app state over `store`.
    #[must_use]
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        Self {
            presence: PresenceManager::new(store.clone()),
            router: MessageRouter::new(store),
            config,
        }
    }
}

/// A [`ChatError`] on its way to the client.
#[derive(Debug)]
pub struct ApiError(ChatError);

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = match &err {
            ChatError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ChatError::Conflict(_) => StatusCode::CONFLICT,
            ChatError::NotFound(_) => StatusCode::NOT_FOUND,
            ChatError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ChatError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %err, "Request failed");
        } else {
            debug!(error = %err, "Request rejected");
        }
        metrics::record_error(err.kind());

        let body = err
            .violations()
            .iter()
            .fold(ErrorBody::new(err.kind(), err.to_string()), |body, v| {
                body.with_detail(v.field, v.reason)
            });

        (status, Json(body)).into_response()
    }
}

/// A JSON request body whose rejections are reported as [`ApiError`]s.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(error = %rejection.body_text(), "Unreadable request body");
                Err(ApiError::from(body_error(&rejection)))
            }
        }
    }
}

fn body_error(rejection: &JsonRejection) -> ChatError {
    let reason = match rejection {
        JsonRejection::MissingJsonContentType(_) => "must be sent as application/json",
        JsonRejection::JsonSyntaxError(_) => "must be valid JSON",
        JsonRejection::JsonDataError(_) => "does not match the expected fields",
        _ => "could not be read",
    };
    ChatError::invalid("body", reason)
}

/// Build the HTTP router.
pub fn app(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/participants", post(register).get(list_participants))
        .route("/messages", post(post_message).get(list_messages))
        .route("/status", post(heartbeat))
        .route("/health", get(health_handler))
        .route_layer(middleware::from_fn(metrics::track_requests));

    let router = if state.config.cors.enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}

/// Run the HTTP server and the sweep scheduler until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(config.clone(), store));

    // Start metrics server if enabled
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    let sweeper = SweepScheduler::new(state.presence.clone(), config.presence.sweep_config())
        .with_observer(|report| metrics::record_evictions(report.evicted.len()))
        .spawn();

    // Bind and serve
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Parlor server listening on {}", addr);

    let served = axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweeper.shutdown().await;
    info!("Parlor server stopped");

    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Name of the acting participant, empty if the header is missing.
///
/// The header is decoded as UTF-8 so names outside ASCII round-trip.
fn user_from(headers: &HeaderMap) -> Result<String, ApiError> {
    match headers.get(USER_HEADER) {
        None => Ok(String::new()),
        Some(value) => std::str::from_utf8(value.as_bytes())
            .map(str::to_string)
            .map_err(|_| ApiError::from(ChatError::invalid("from", "must be valid UTF-8"))),
    }
}

/// Health check handler.
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timeout_ms": state.config.presence.timeout_ms
    }))
}

async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<StatusCode, ApiError> {
    state.presence.register(&body.name).await?;
    metrics::record_registration();
    Ok(StatusCode::CREATED)
}

async fn list_participants(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Participant>>, ApiError> {
    Ok(Json(state.presence.list_active().await?))
}

async fn post_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    JsonBody(body): JsonBody<PostMessageRequest>,
) -> Result<StatusCode, ApiError> {
    let draft = MessageDraft::new(user_from(&headers)?, body.to, body.text, body.kind);

    let message = state.router.post_message(draft).await.map_err(|e| {
        if matches!(e, ChatError::Unauthenticated(_)) {
            warn!(error = %e, "Rejected message from inactive sender");
        }
        e
    })?;

    metrics::record_message(message.kind.as_str());
    Ok(StatusCode::CREATED)
}

async fn list_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let limit = parse_limit(query.limit.as_deref())?;
    let viewer = user_from(&headers)?;
    Ok(Json(state.router.list_visible(&viewer, limit).await?))
}

async fn heartbeat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    state.presence.heartbeat(&user_from(&headers)?).await?;
    metrics::record_heartbeat();
    Ok(StatusCode::OK)
}
