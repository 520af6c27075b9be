//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::Aggregate;
use event_store::EventStore;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub phase: &'static str,
    pub version: i64,
}

/// GET /health: returns service health and the position of the log.
pub async fn check<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<HealthResponse> {
    let model = state.coordinator.read().await;
    Json(HealthResponse {
        status: "ok",
        phase: model.phase().as_attr(),
        version: model.version().as_i64(),
    })
}
