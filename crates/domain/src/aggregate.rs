//! Core aggregate and domain event traits.

use chrono::{DateTime, Utc};
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events describe an intent that has been accepted. Once logged they
/// are facts and are replayed as such.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name.
    ///
    /// This is the name written to the log and used to find the event again
    /// during replay. It must never change for an event that has been logged.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregates in an event-sourced system.
///
/// In event sourcing, aggregates:
/// - Are rebuilt by replaying events
/// - Check events against their current state before they are logged
/// - Apply events to update state (pure, deterministic)
pub trait Aggregate: Default + Send + Sync + Sized {
    /// The type of events this aggregate consumes.
    type Event: DomainEvent;

    /// The type of errors validation can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the number of events applied so far.
    fn version(&self) -> Version;

    /// Sets the aggregate version.
    ///
    /// Called after an event from the log has been applied.
    fn set_version(&mut self, version: Version);

    /// Checks whether `event` may be applied to the current state.
    fn validate(&self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Applies an event to the aggregate, updating its state.
    ///
    /// This method must be pure and deterministic:
    /// - Given the same state, event and timestamp, it must always produce the same new state
    /// - It must not have side effects
    /// - It must not fail (only validated events reach it)
    fn apply(&mut self, event: Self::Event, at: DateTime<Utc>);
}
