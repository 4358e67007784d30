//! Panel HTTP surface.
//!
//! The visual panel is an external collaborator; it consumes the snapshot
//! JSON and posts lock requests here, nothing more.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use bandwatch_core::band::BandSelection;
use bandwatch_core::snapshot::PanelSnapshot;

use crate::AgentState;

pub fn router(state: Arc<AgentState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/snapshot", get(snapshot))
        .route("/api/lock", post(lock))
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html><head><title>Bandwatch</title></head>
<body>
<h1>Bandwatch Agent</h1>
<p>Modem telemetry and band locking. <a href="/api/snapshot">View snapshot JSON</a></p>
</body></html>"#,
    )
}

async fn snapshot(State(state): State<Arc<AgentState>>) -> Json<PanelSnapshot> {
    let mut snapshot = state.snapshot.lock().await.clone();
    // Lock state and notices may have moved since the last poll tick.
    snapshot.lock_in_flight = state.orchestrator.suspended();
    snapshot.notice = state.orchestrator.notice();
    Json(snapshot)
}

#[derive(Debug, Deserialize)]
struct LockRequest {
    expression: String,
    /// Overrides the configured force-LTE toggle for this request.
    #[serde(default)]
    force_lte_only: Option<bool>,
}

async fn lock(
    State(state): State<Arc<AgentState>>,
    Json(request): Json<LockRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    // Validate up front so the caller gets a meaningful status; the
    // sequence itself runs in the background.
    if let Err(error) = BandSelection::parse(&request.expression) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": error.to_string() })),
        );
    }
    if state.orchestrator.suspended() {
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "a band-lock sequence is already in flight" })),
        );
    }

    let force = request
        .force_lte_only
        .unwrap_or(state.config.force_lte_only);
    let expression = request.expression.clone();
    let task_state = state.clone();
    tokio::spawn(async move {
        if let Err(error) = task_state.orchestrator.apply(&expression, force).await {
            tracing::warn!(%error, expression = %expression, "band lock request failed");
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "status": "applying",
            "expression": request.expression,
        })),
    )
}
