//! The bidding round aggregate.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::BidderId;
use event_store::{EventEnvelope, Version};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::{DomainError, ValidationError};
use crate::iban::canonicalize_iban;

use super::{
    Bid, Bidder, ModelEvent, RoundPhase,
    events::{
        AcceptContractData, CreateBidderData, DeleteBidderData, ResetAllBidsData, SetBidData,
        SetPhaseData, SetPresentData, SetSelfEditData, UpdateBidderData,
    },
};

/// Range bidder ids are drawn from. Six digits are easy to type at login.
pub const BIDDER_ID_RANGE: std::ops::Range<u32> = 100_000..1_000_000;

/// Aggregate root of a bidding round.
///
/// Holds every bidder and the current phase. The only way to change it is
/// [`ModelEvent::apply`]; the command methods below build events without
/// touching the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub(super) bidders: BTreeMap<BidderId, Bidder>,
    pub(super) phase: RoundPhase,

    /// Commit time of the last applied event.
    pub(super) updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    version: Version,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            bidders: BTreeMap::new(),
            phase: RoundPhase::Registration,
            updated_at: None,
            version: Version::initial(),
        }
    }
}

impl Aggregate for Model {
    type Event = ModelEvent;
    type Error = ValidationError;

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn validate(&self, event: &Self::Event) -> Result<(), Self::Error> {
        event.validate(self)
    }

    fn apply(&mut self, event: Self::Event, at: DateTime<Utc>) {
        event.apply(self, at);
    }
}

// Query methods
impl Model {
    /// Creates an empty round in the registration phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a model from logged events, in log order.
    ///
    /// Fails on the first event with an unknown name or one that no longer
    /// validates; a partial model is never returned.
    pub fn replay(events: impl IntoIterator<Item = EventEnvelope>) -> Result<Self, DomainError> {
        let mut model = Model::new();

        for envelope in events {
            let event = ModelEvent::decode(&envelope.event_type, envelope.payload)?;
            model
                .validate(&event)
                .map_err(|source| DomainError::CorruptLog {
                    version: envelope.version,
                    source,
                })?;
            model.apply(event, envelope.timestamp);
            model.set_version(envelope.version);
        }

        Ok(model)
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn bidder(&self, id: BidderId) -> Option<&Bidder> {
        self.bidders.get(&id)
    }

    pub fn contains(&self, id: BidderId) -> bool {
        self.bidders.contains_key(&id)
    }

    /// Returns all bidders ordered by id.
    pub fn bidders(&self) -> impl Iterator<Item = &Bidder> {
        self.bidders.values()
    }

    /// Returns all bidders ordered by last name, first name and id.
    pub fn bidders_by_name(&self) -> Vec<&Bidder> {
        let mut bidders: Vec<&Bidder> = self.bidders.values().collect();
        bidders.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
                .then_with(|| a.id.cmp(&b.id))
        });
        bidders
    }

    pub fn bidder_count(&self) -> usize {
        self.bidders.len()
    }

    /// Returns the sum of all monthly bids.
    pub fn total_bids(&self) -> Bid {
        Bid::from_cents(
            self.bidders
                .values()
                .fold(0u64, |sum, b| sum.saturating_add(b.bid.cents())),
        )
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

// Command methods (return events)
impl Model {
    /// Registers a new bidder under a fresh random id.
    pub fn create_bidder(&self) -> ModelEvent {
        self.create_bidder_with(&mut rand::rng())
    }

    /// Like [`Model::create_bidder`] with a caller-supplied random source.
    ///
    /// Draws again until the id is not taken.
    pub fn create_bidder_with<R: Rng + ?Sized>(&self, rng: &mut R) -> ModelEvent {
        let id = loop {
            let id = BidderId::new(rng.random_range(BIDDER_ID_RANGE));
            if !self.contains(id) {
                break id;
            }
        };
        ModelEvent::CreateBidder(CreateBidderData { id })
    }

    /// Replaces a bidder's record. The IBAN is stored in blocks of four.
    pub fn update_bidder(&self, mut bidder: Bidder) -> ModelEvent {
        bidder.iban = canonicalize_iban(&bidder.iban);
        ModelEvent::UpdateBidder(UpdateBidderData { bidder })
    }

    pub fn delete_bidder(&self, id: BidderId) -> ModelEvent {
        ModelEvent::DeleteBidder(DeleteBidderData { id })
    }

    pub fn accept_contract(&self, id: BidderId) -> ModelEvent {
        ModelEvent::AcceptContract(AcceptContractData { id })
    }

    pub fn set_phase(&self, phase: RoundPhase) -> ModelEvent {
        ModelEvent::SetPhase(SetPhaseData { phase })
    }

    pub fn set_bid(&self, id: BidderId, bid: Bid) -> ModelEvent {
        ModelEvent::SetBid(SetBidData { id, bid })
    }

    pub fn reset_all_bids(&self) -> ModelEvent {
        ModelEvent::ResetAllBids(ResetAllBidsData {})
    }

    pub fn set_present(&self, id: BidderId, present: bool) -> ModelEvent {
        ModelEvent::SetPresent(SetPresentData { id, present })
    }

    pub fn set_self_edit(&self, id: BidderId, self_edit: bool) -> ModelEvent {
        ModelEvent::SetSelfEdit(SetSelfEditData { id, self_edit })
    }
}

impl ModelEvent {
    /// Wraps the event for the log at `version`.
    pub fn to_envelope(
        &self,
        version: Version,
        at: DateTime<Utc>,
    ) -> Result<EventEnvelope, DomainError> {
        Ok(EventEnvelope::builder()
            .event_type(self.event_type())
            .version(version)
            .timestamp(at)
            .payload_raw(self.payload()?)
            .build())
    }
}
