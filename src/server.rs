//! HTTP ingress for storage webhooks.
//!
//! A thin shell over [`WebhookDispatcher`]: routing, status-code mapping and
//! CORS live here, all event logic lives in the dispatcher.

use axum::extract::State;
use axum::http::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::modules::webhook::{DispatchOutcome, WebhookDispatcher};

pub struct AppState {
    pub dispatcher: WebhookDispatcher,
}

/// Build the complete router for the service.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhooks/storage", post(dispatch_storage_event))
        .route("/health", get(get_health))
        .layer(cors_layer())
        .with_state(state)
}

// TODO: restrict allow_origin to the storage service's host before exposing
// this endpoint publicly.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            CONTENT_TYPE,
        ])
}

/// Storage change webhook.
///
/// Replies 200 for both dispatched and ignored events, 422 for payloads
/// that would fail identically on redelivery, and 500 when the job queue
/// refused the work so the storage service retries the delivery.
async fn dispatch_storage_event(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    match state.dispatcher.handle(&body).await {
        DispatchOutcome::Accepted(job) => (StatusCode::OK, Json(job)).into_response(),
        DispatchOutcome::Ignored(_) => (StatusCode::OK, "OK").into_response(),
        DispatchOutcome::Unprocessable(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": errors })),
        )
            .into_response(),
        DispatchOutcome::Failed(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response(),
    }
}

/// Heartbeat endpoint for load balancers and monitoring.
async fn get_health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
