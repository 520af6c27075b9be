//! Domain error types.

use common::BidderId;
use event_store::{EventStoreError, Version};
use thiserror::Error;

use crate::round::RoundPhase;

/// Shown to users for every failure that is not a validation failure.
pub const FALLBACK_MESSAGE: &str = "Unknown error";

/// Reasons an event is rejected against the current model.
///
/// The model is left untouched whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Bidder {0} already exists")]
    DuplicateBidder(BidderId),

    #[error("Bidder {0} does not exist")]
    UnknownBidder(BidderId),

    #[error("Registration is closed in phase {}", .0.as_attr())]
    RegistrationClosed(RoundPhase),

    #[error("Invalid phase: {}", .0.as_attr())]
    InvalidPhase(RoundPhase),
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The event does not fit the current model.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The log contains an event name this build does not know.
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    /// A logged event no longer validates during replay.
    #[error("Corrupt event log at version {version}: {source}")]
    CorruptLog {
        version: Version,
        #[source]
        source: ValidationError,
    },

    /// The task committing an event did not finish.
    #[error("Commit aborted: {0}")]
    CommitAborted(String),
}

impl DomainError {
    /// Returns the message that may be shown to a user.
    ///
    /// Only validation failures are meaningful to users; everything else is
    /// reported with [`FALLBACK_MESSAGE`].
    pub fn user_message(&self) -> String {
        match self {
            DomainError::Validation(e) => e.to_string(),
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }
}
