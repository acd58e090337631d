//! HTTP routes and the WebSocket handshake.

use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use overlay_core::StateDocument;
use serde::Deserialize;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::ServerConfig;
use crate::health;
use crate::registry::Role;
use crate::session::handle_socket;
use crate::AppState;

/// Query parameters accepted on the WebSocket handshake.
#[derive(Debug, Default, Deserialize)]
pub struct HandshakeParams {
    /// Which side the client is on; consumer when absent.
    #[serde(default)]
    pub role: Option<Role>,
}

/// Build a CORS layer for the configured origins.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Build the application router.
///
/// `/metrics` is only mounted when a Prometheus handle is supplied.
pub fn router(state: AppState, metrics: Option<PrometheusHandle>) -> Router {
    let cors = build_cors_layer(&state.config);
    let ws_path = state.config.ws_path.clone();

    let mut app = Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health", get(health::health))
        .route("/api/state", get(get_state))
        .route(&ws_path, get(websocket_handler))
        .fallback(not_found)
        .with_state(state);

    if let Some(handle) = metrics {
        let metrics_router = Router::new()
            .route("/metrics", get(metrics_handler))
            .with_state(handle);
        app = app.merge(metrics_router);
    }

    app
        // Request ID for distributed tracing correlation
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
        // Structured request tracing with timing
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Real-time channel handshake.
///
/// An unrecognised `role` is rejected with 400 before the upgrade.
#[tracing::instrument(name = "websocket_connect", skip(ws, state))]
async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<HandshakeParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let role = params.role.unwrap_or_default();
    tracing::info!(%role, "WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state.sync, role))
}

/// Current canvas, read-only, exactly as its producer sent it.
#[tracing::instrument(name = "get_state", skip(state))]
async fn get_state(State(state): State<AppState>) -> Json<StateDocument> {
    Json(state.sync.snapshot())
}

/// Anything else gets a plain 404 with `Connection: close`.
///
/// No upgrade response is ever sent from here: a WebSocket handshake on the
/// wrong path is answered with this 404 like any other request.
async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, [(header::CONNECTION, "close")])
}

/// Prometheus metrics endpoint.
#[tracing::instrument(name = "metrics", skip(handle))]
async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
