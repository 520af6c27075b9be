//! Reading and switching the phase of the round.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use domain::{Model, RoundPhase};
use event_store::EventStore;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct SetPhaseRequest {
    /// Form token such as `"offer"`. Unknown tokens are rejected.
    pub phase: String,
}

#[derive(Serialize)]
pub struct PhaseResponse {
    pub phase: RoundPhase,
    pub name: &'static str,
    pub can_register: bool,
    pub can_bid: bool,
    pub bidders: usize,
    pub total_bids: u64,
    pub total_bids_display: String,
}

impl PhaseResponse {
    fn from_model(model: &Model) -> Self {
        let phase = model.phase();
        let total = model.total_bids();
        Self {
            phase,
            name: phase.as_str(),
            can_register: phase.can_register(),
            can_bid: phase.can_bid(),
            bidders: model.bidder_count(),
            total_bids: total.cents(),
            total_bids_display: total.to_string(),
        }
    }
}

/// GET /phase: the current phase with round totals.
pub async fn get<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<PhaseResponse> {
    let model = state.coordinator.read().await;
    Json(PhaseResponse::from_model(&model))
}

/// PUT /phase: moves the round to another phase. Admin only.
#[tracing::instrument(skip(state, headers, req), fields(phase = %req.phase))]
pub async fn set<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<SetPhaseRequest>,
) -> Result<Json<PhaseResponse>, ApiError> {
    state.require_admin(&headers)?;

    let phase = RoundPhase::from_attr(req.phase.trim());
    state
        .commit_with(
            move |m| Ok(m.set_phase(phase)),
            |_, m| Ok(PhaseResponse::from_model(m)),
        )
        .await
        .map(Json)
}
