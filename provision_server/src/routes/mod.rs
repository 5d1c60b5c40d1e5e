//! Provisioning service HTTP routes.

pub mod provision;

use axum::body::Bytes;
use axum::http::HeaderMap;
use axum::response::{Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use tower_http::trace::TraceLayer;

use provision_pipeline::ProvisionConfig;

use crate::inflight::InFlight;

/// Shared state for route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ProvisionConfig,
    pub inflight: InFlight,
}

impl AppState {
    pub fn new(config: ProvisionConfig) -> Self {
        Self {
            config,
            inflight: InFlight::new(),
        }
    }
}

/// Build the service router.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/api/provision", post(provision_handler))
        .route("/api/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn provision_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    provision::handle_provision(&state, &headers, body).await
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "provision-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
