//! Bidder registration, editing and bidding endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use common::BidderId;
use domain::{
    Bid, Bidder, DistributionSite, DomainError, InvalidFields, Model, RoundPhase, ShareSplit,
    ValidationError,
};
use event_store::EventStore;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

/// Editable bidder fields. Absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct BidderForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub member: Option<bool>,
    pub distribution_site: Option<String>,
    pub share_split: Option<String>,
    pub contract_partner: Option<String>,
    pub iban: Option<String>,
    pub account_holder: Option<String>,
    pub yearly: Option<bool>,
}

impl BidderForm {
    /// Copies every submitted field onto `bidder`, trimming text.
    pub fn apply_to(self, bidder: &mut Bidder) {
        fn text(target: &mut String, value: Option<String>) {
            if let Some(value) = value {
                *target = value.trim().to_string();
            }
        }

        text(&mut bidder.first_name, self.first_name);
        text(&mut bidder.last_name, self.last_name);
        text(&mut bidder.email, self.email);
        text(&mut bidder.address, self.address);
        text(&mut bidder.phone, self.phone);
        text(&mut bidder.contract_partner, self.contract_partner);
        text(&mut bidder.iban, self.iban);
        text(&mut bidder.account_holder, self.account_holder);

        if let Some(member) = self.member {
            bidder.member = member;
        }
        if let Some(yearly) = self.yearly {
            bidder.yearly = yearly;
        }
        if let Some(site) = self.distribution_site {
            bidder.distribution_site = DistributionSite::from_attr(site.trim());
        }
        if let Some(split) = self.share_split {
            bidder.share_split = ShareSplit::from_attr(split.trim());
        }
    }
}

#[derive(Deserialize)]
pub struct SetBidRequest {
    /// Amount as typed, e.g. `"81,50 €"`.
    pub bid: String,
}

#[derive(Deserialize)]
pub struct SetPresentRequest {
    pub present: bool,
}

#[derive(Deserialize)]
pub struct SetSelfEditRequest {
    pub self_edit: bool,
}

// -- Response types --

#[derive(Serialize)]
pub struct BidderResponse {
    #[serde(flatten)]
    pub bidder: Bidder,
    pub full_name: String,
    pub payer: String,
    pub bid_display: String,
    pub annual_amount: u64,
    pub annual_amount_display: String,
    pub invalid_fields: InvalidFields,
    pub can_self_edit: bool,
    pub can_place_bid: bool,
}

impl BidderResponse {
    fn new(bidder: &Bidder, phase: RoundPhase) -> Self {
        let annual = bidder.annual_amount();
        Self {
            bidder: bidder.clone(),
            full_name: bidder.full_name(),
            payer: bidder.account_holder(),
            bid_display: bidder.bid.to_string(),
            annual_amount: annual.cents(),
            annual_amount_display: annual.to_string(),
            invalid_fields: bidder.invalid_fields(),
            can_self_edit: bidder.can_self_edit(phase),
            can_place_bid: bidder.can_place_bid(phase),
        }
    }
}

#[derive(Serialize)]
pub struct BidderListResponse {
    pub phase: RoundPhase,
    pub total_bids: u64,
    pub total_bids_display: String,
    pub bidders: Vec<BidderResponse>,
}

// -- Handlers --

/// GET /bidders: every bidder sorted by name. Admin only.
pub async fn list<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<BidderListResponse>, ApiError> {
    state.require_admin(&headers)?;

    let model = state.coordinator.read().await;
    let phase = model.phase();
    let total = model.total_bids();

    Ok(Json(BidderListResponse {
        phase,
        total_bids: total.cents(),
        total_bids_display: total.to_string(),
        bidders: model
            .bidders_by_name()
            .into_iter()
            .map(|b| BidderResponse::new(b, phase))
            .collect(),
    }))
}

/// POST /bidders: registers a new bidder under a random id.
///
/// Participants can only register during registration. The administrator
/// is not gated here but the round still refuses new bidders in later phases.
#[tracing::instrument(skip(state, headers))]
pub async fn create<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<BidderResponse>), ApiError> {
    let admin = state.is_admin(&headers);

    let response = state
        .commit_with(
            move |m| {
                if !admin && !m.phase().can_register() {
                    return Err(ApiError::Forbidden("Registration is closed".to_string()));
                }
                Ok(m.create_bidder())
            },
            |event, m| {
                let id = event.bidder_id().ok_or_else(|| {
                    ApiError::Internal("created event carries no bidder id".to_string())
                })?;
                bidder_response(m, id)
            },
        )
        .await?;

    tracing::info!(bidder = %response.bidder.id, "bidder registered");
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /bidders/{id}: one bidder including validation results.
pub async fn get<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<BidderResponse>, ApiError> {
    let id = parse_bidder_id(&id)?;

    let model = state.coordinator.read().await;
    Ok(Json(bidder_response(&model, id)?))
}

/// PUT /bidders/{id}: updates the submitted fields of a bidder.
///
/// Allowed for the administrator and for bidders that may edit themselves
/// in the current phase.
#[tracing::instrument(skip(state, headers, form))]
pub async fn update<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(form): Json<BidderForm>,
) -> Result<Json<BidderResponse>, ApiError> {
    let id = parse_bidder_id(&id)?;
    let admin = state.is_admin(&headers);

    state
        .commit_with(
            move |m| {
                let current = m.bidder(id).ok_or_else(|| unknown_bidder(id))?;
                if !admin && !current.can_self_edit(m.phase()) {
                    return Err(ApiError::Forbidden(
                        "Bidder data can no longer be changed".to_string(),
                    ));
                }

                let mut bidder = current.clone();
                form.apply_to(&mut bidder);
                Ok(m.update_bidder(bidder))
            },
            move |_, m| bidder_response(m, id),
        )
        .await
        .map(Json)
}

/// DELETE /bidders/{id}: removes a bidder. Admin only.
#[tracing::instrument(skip(state, headers))]
pub async fn remove<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.require_admin(&headers)?;
    let id = parse_bidder_id(&id)?;

    state.commit(move |m| Ok(m.delete_bidder(id))).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /bidders/{id}/contract: the bidder accepts the contract.
#[tracing::instrument(skip(state))]
pub async fn accept_contract<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<BidderResponse>, ApiError> {
    let id = parse_bidder_id(&id)?;

    state
        .commit_with(
            move |m| Ok(m.accept_contract(id)),
            move |_, m| bidder_response(m, id),
        )
        .await
        .map(Json)
}

/// PUT /bidders/{id}/bid: places a monthly bid.
///
/// Participants must be present and the round must collect bids; the
/// administrator may enter bids at any time.
#[tracing::instrument(skip(state, headers, req))]
pub async fn set_bid<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<SetBidRequest>,
) -> Result<Json<BidderResponse>, ApiError> {
    let id = parse_bidder_id(&id)?;
    let bid = Bid::parse(&req.bid)?;
    let admin = state.is_admin(&headers);

    state
        .commit_with(
            move |m| {
                let bidder = m.bidder(id).ok_or_else(|| unknown_bidder(id))?;
                if !admin && !bidder.can_place_bid(m.phase()) {
                    return Err(ApiError::Forbidden("Bidding is not open".to_string()));
                }
                Ok(m.set_bid(id, bid))
            },
            move |_, m| bidder_response(m, id),
        )
        .await
        .map(Json)
}

/// PUT /bidders/{id}/present: marks attendance. Admin only.
#[tracing::instrument(skip(state, headers, req))]
pub async fn set_present<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<SetPresentRequest>,
) -> Result<Json<BidderResponse>, ApiError> {
    state.require_admin(&headers)?;
    let id = parse_bidder_id(&id)?;

    state
        .commit_with(
            move |m| Ok(m.set_present(id, req.present)),
            move |_, m| bidder_response(m, id),
        )
        .await
        .map(Json)
}

/// PUT /bidders/{id}/self-edit: lets a bidder edit during validation. Admin only.
#[tracing::instrument(skip(state, headers, req))]
pub async fn set_self_edit<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<SetSelfEditRequest>,
) -> Result<Json<BidderResponse>, ApiError> {
    state.require_admin(&headers)?;
    let id = parse_bidder_id(&id)?;

    state
        .commit_with(
            move |m| Ok(m.set_self_edit(id, req.self_edit)),
            move |_, m| bidder_response(m, id),
        )
        .await
        .map(Json)
}

/// DELETE /bids: clears every bid. Admin only.
#[tracing::instrument(skip(state, headers))]
pub async fn reset_bids<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    state.require_admin(&headers)?;

    state.commit(|m| Ok(m.reset_all_bids())).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn bidder_response(model: &Model, id: BidderId) -> Result<BidderResponse, ApiError> {
    model
        .bidder(id)
        .map(|b| BidderResponse::new(b, model.phase()))
        .ok_or_else(|| unknown_bidder(id))
}

fn unknown_bidder(id: BidderId) -> ApiError {
    DomainError::from(ValidationError::UnknownBidder(id)).into()
}

fn parse_bidder_id(id: &str) -> Result<BidderId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid bidder id {id:?}: {e}")))
}
