//! HTTP surface: the Snipcart webhook endpoint and a health check.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::application::WebhookDispatcher;
use crate::domain::events::ValidationError;

pub const REQUEST_TOKEN_HEADER: &str = "x-snipcart-requesttoken";

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<WebhookDispatcher>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "healthy", "service": "snipcart-relay"})) }))
        .route("/webhooks/snipcart", post(snipcart_webhook))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn snipcart_webhook(State(s): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let token = headers.get(REQUEST_TOKEN_HEADER).and_then(|v| v.to_str().ok());
    match s.dispatcher.handle(&body, token).await {
        Ok(payload) => Json(payload).into_response(),
        Err(e) => e.into_response(),
    }
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        warn!("Rejected webhook: {}", self);
        (StatusCode::BAD_REQUEST, Json(json!({"success": false, "errors": {"reason": self.to_string()}}))).into_response()
    }
}
