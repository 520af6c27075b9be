//! Append-only event log.
//!
//! The log stores `(timestamp, event type, payload)` entries in the order they
//! were committed. It knows nothing about the domain: payloads are opaque JSON
//! and replay simply streams every entry back in order.

pub mod error;
pub mod event;
pub mod file;
pub mod memory;
pub mod query;
pub mod store;

pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use file::FileEventStore;
pub use memory::InMemoryEventStore;
pub use query::EventQuery;
pub use store::{AppendOptions, EventStore, EventStoreExt, EventStream};
