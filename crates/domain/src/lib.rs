//! Domain layer of the bidding round.
//!
//! This crate provides:
//! - Aggregate and DomainEvent traits for event-sourced state
//! - The bidding round [`Model`] with its bidders, phases and event catalog
//! - The [`Coordinator`] that serializes writers and persists every event
//!   before it is applied
//! - IBAN and e-mail checks used by bidder validation

pub mod aggregate;
pub mod coordinator;
pub mod email;
pub mod error;
pub mod iban;
pub mod notify;
pub mod round;

pub use aggregate::{Aggregate, DomainEvent};
pub use coordinator::{Coordinator, WriteSection};
pub use error::{DomainError, FALLBACK_MESSAGE, ValidationError};
pub use notify::{Committed, Notifier};
pub use round::{
    Bid, BidParseError, Bidder, DistributionSite, InvalidFields, Model, ModelEvent, RoundPhase,
    ShareSplit,
};
