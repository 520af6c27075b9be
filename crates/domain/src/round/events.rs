//! Bidding round events.
//!
//! Every change to the [`Model`] is one of these events. The name returned
//! by [`DomainEvent::event_type`] is written to the log next to the payload
//! and is how [`ModelEvent::decode`] finds the event again on replay.

use chrono::{DateTime, Utc};
use common::BidderId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::error::{DomainError, ValidationError};

use super::{Bid, Bidder, Model, RoundPhase};

/// Events that can occur in a bidding round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ModelEvent {
    /// A bidder registered.
    CreateBidder(CreateBidderData),

    /// A bidder's record was replaced.
    UpdateBidder(UpdateBidderData),

    /// A bidder was removed.
    DeleteBidder(DeleteBidderData),

    /// A bidder accepted the contract.
    AcceptContract(AcceptContractData),

    /// The administrator moved the round to another phase.
    SetPhase(SetPhaseData),

    /// A bid was placed or corrected.
    SetBid(SetBidData),

    /// All bids were cleared for another bidding pass.
    ResetAllBids(ResetAllBidsData),

    /// A bidder was marked present or absent.
    SetPresent(SetPresentData),

    /// A bidder was allowed or forbidden to edit during validation.
    SetSelfEdit(SetSelfEditData),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBidderData {
    pub id: BidderId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBidderData {
    pub bidder: Bidder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteBidderData {
    pub id: BidderId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptContractData {
    pub id: BidderId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPhaseData {
    pub phase: RoundPhase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetBidData {
    pub id: BidderId,
    pub bid: Bid,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResetAllBidsData {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPresentData {
    pub id: BidderId,
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSelfEditData {
    pub id: BidderId,
    pub self_edit: bool,
}

impl DomainEvent for ModelEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ModelEvent::CreateBidder(_) => "create-bidder",
            ModelEvent::UpdateBidder(_) => "update-bidder",
            ModelEvent::DeleteBidder(_) => "delete-bidder",
            ModelEvent::AcceptContract(_) => "accept-contract",
            ModelEvent::SetPhase(_) => "set-phase",
            ModelEvent::SetBid(_) => "set-bid",
            ModelEvent::ResetAllBids(_) => "reset-all-bids",
            ModelEvent::SetPresent(_) => "set-present",
            ModelEvent::SetSelfEdit(_) => "set-self-edit",
        }
    }
}

impl ModelEvent {
    /// Every event name, in catalog order.
    pub const NAMES: [&'static str; 9] = [
        "create-bidder",
        "update-bidder",
        "delete-bidder",
        "accept-contract",
        "set-phase",
        "set-bid",
        "reset-all-bids",
        "set-present",
        "set-self-edit",
    ];

    /// Returns the payload as it is written to the log, without the name.
    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            ModelEvent::CreateBidder(data) => serde_json::to_value(data),
            ModelEvent::UpdateBidder(data) => serde_json::to_value(data),
            ModelEvent::DeleteBidder(data) => serde_json::to_value(data),
            ModelEvent::AcceptContract(data) => serde_json::to_value(data),
            ModelEvent::SetPhase(data) => serde_json::to_value(data),
            ModelEvent::SetBid(data) => serde_json::to_value(data),
            ModelEvent::ResetAllBids(data) => serde_json::to_value(data),
            ModelEvent::SetPresent(data) => serde_json::to_value(data),
            ModelEvent::SetSelfEdit(data) => serde_json::to_value(data),
        }
    }

    /// Rebuilds an event from its logged name and payload.
    ///
    /// Unknown names are reported as [`DomainError::UnknownEventType`] so
    /// that replay can refuse a log written by a newer build.
    pub fn decode(event_type: &str, payload: serde_json::Value) -> Result<Self, DomainError> {
        let event = match event_type {
            "create-bidder" => ModelEvent::CreateBidder(serde_json::from_value(payload)?),
            "update-bidder" => ModelEvent::UpdateBidder(serde_json::from_value(payload)?),
            "delete-bidder" => ModelEvent::DeleteBidder(serde_json::from_value(payload)?),
            "accept-contract" => ModelEvent::AcceptContract(serde_json::from_value(payload)?),
            "set-phase" => ModelEvent::SetPhase(serde_json::from_value(payload)?),
            "set-bid" => ModelEvent::SetBid(serde_json::from_value(payload)?),
            "reset-all-bids" => ModelEvent::ResetAllBids(serde_json::from_value(payload)?),
            "set-present" => ModelEvent::SetPresent(serde_json::from_value(payload)?),
            "set-self-edit" => ModelEvent::SetSelfEdit(serde_json::from_value(payload)?),
            other => return Err(DomainError::UnknownEventType(other.to_string())),
        };
        Ok(event)
    }

    /// Checks the event against the current model without changing it.
    pub fn validate(&self, model: &Model) -> Result<(), ValidationError> {
        match self {
            ModelEvent::CreateBidder(data) => {
                if model.contains(data.id) {
                    return Err(ValidationError::DuplicateBidder(data.id));
                }
                if !model.phase().can_register() {
                    return Err(ValidationError::RegistrationClosed(model.phase()));
                }
                Ok(())
            }
            ModelEvent::UpdateBidder(data) => require_bidder(model, data.bidder.id),
            ModelEvent::DeleteBidder(data) => require_bidder(model, data.id),
            ModelEvent::AcceptContract(data) => require_bidder(model, data.id),
            ModelEvent::SetPhase(data) => {
                if data.phase.is_valid() {
                    Ok(())
                } else {
                    Err(ValidationError::InvalidPhase(data.phase))
                }
            }
            ModelEvent::SetBid(data) => require_bidder(model, data.id),
            ModelEvent::ResetAllBids(_) => Ok(()),
            ModelEvent::SetPresent(data) => require_bidder(model, data.id),
            ModelEvent::SetSelfEdit(data) => require_bidder(model, data.id),
        }
    }

    /// Applies a validated event.
    ///
    /// Deterministic: the only outside input is the commit timestamp, which
    /// comes from the log.
    pub fn apply(self, model: &mut Model, at: DateTime<Utc>) {
        match self {
            ModelEvent::CreateBidder(data) => {
                model.bidders.insert(data.id, Bidder::new(data.id));
            }
            ModelEvent::UpdateBidder(data) => {
                model.bidders.insert(data.bidder.id, data.bidder);
            }
            ModelEvent::DeleteBidder(data) => {
                model.bidders.remove(&data.id);
            }
            ModelEvent::AcceptContract(data) => {
                if let Some(bidder) = model.bidders.get_mut(&data.id) {
                    bidder.contract_accepted = true;
                }
            }
            ModelEvent::SetPhase(data) => model.phase = data.phase,
            ModelEvent::SetBid(data) => {
                if let Some(bidder) = model.bidders.get_mut(&data.id) {
                    bidder.bid = data.bid;
                }
            }
            ModelEvent::ResetAllBids(_) => {
                for bidder in model.bidders.values_mut() {
                    bidder.bid = Bid::zero();
                }
            }
            ModelEvent::SetPresent(data) => {
                if let Some(bidder) = model.bidders.get_mut(&data.id) {
                    bidder.present = data.present;
                }
            }
            ModelEvent::SetSelfEdit(data) => {
                if let Some(bidder) = model.bidders.get_mut(&data.id) {
                    bidder.self_edit = data.self_edit;
                }
            }
        }
        model.updated_at = Some(at);
    }

    /// Returns the bidder the event is about, if any.
    pub fn bidder_id(&self) -> Option<BidderId> {
        match self {
            ModelEvent::CreateBidder(data) => Some(data.id),
            ModelEvent::UpdateBidder(data) => Some(data.bidder.id),
            ModelEvent::DeleteBidder(data) => Some(data.id),
            ModelEvent::AcceptContract(data) => Some(data.id),
            ModelEvent::SetBid(data) => Some(data.id),
            ModelEvent::SetPresent(data) => Some(data.id),
            ModelEvent::SetSelfEdit(data) => Some(data.id),
            ModelEvent::SetPhase(_) | ModelEvent::ResetAllBids(_) => None,
        }
    }
}

fn require_bidder(model: &Model, id: BidderId) -> Result<(), ValidationError> {
    if model.contains(id) {
        Ok(())
    } else {
        Err(ValidationError::UnknownBidder(id))
    }
}
