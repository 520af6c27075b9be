use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use futures_util::TryStreamExt;

use crate::{EventEnvelope, EventQuery, EventStoreError, Result, Version};

/// Options for appending events to the store.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Version the log is expected to be at before the append.
    /// If None, no version check is performed (use with caution).
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the log to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the log to be empty.
    pub fn expect_empty() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// A stream of events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope>> + Send>>;

/// Core trait for event log implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends events to the log.
    ///
    /// Events are appended atomically - either all succeed or none do - and
    /// are durable once this returns `Ok`. If `options.expected_version` is
    /// set, the operation fails with `ConcurrencyConflict` when the log is at
    /// a different version.
    ///
    /// Returns the version of the log after appending.
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version>;

    /// Streams all events in the log in commit order.
    async fn stream_all_events(&self) -> Result<EventStream>;

    /// Retrieves events matching a query, in commit order.
    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>>;

    /// Retrieves events by type, in commit order.
    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>>;

    /// Returns the version of the last committed event.
    async fn current_version(&self) -> Result<Version>;
}

/// Extension trait providing convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Appends a single event to the log.
    async fn append_event(&self, event: EventEnvelope, options: AppendOptions) -> Result<Version> {
        self.append(vec![event], options).await
    }

    /// Collects every event in the log.
    async fn load_all(&self) -> Result<Vec<EventEnvelope>> {
        self.stream_all_events().await?.try_collect().await
    }
}

// Blanket implementation for all EventStore implementations
impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Validates a batch against the log's current version before appending.
///
/// The batch must be non-empty, its versions must be sequential and it must
/// start right after `current`.
pub fn validate_events_for_append(
    events: &[EventEnvelope],
    current: Version,
    options: &AppendOptions,
) -> Result<()> {
    if let Some(expected) = options.expected_version
        && expected != current
    {
        return Err(EventStoreError::ConcurrencyConflict {
            expected,
            actual: current,
        });
    }

    if events.is_empty() {
        return Err(EventStoreError::InvalidAppend(
            "Cannot append empty event list".to_string(),
        ));
    }

    let mut expected_version = current;
    for event in events {
        expected_version = expected_version.next();
        if event.version != expected_version {
            return Err(EventStoreError::InvalidAppend(format!(
                "Event versions must be sequential. Expected {}, got {}",
                expected_version, event.version
            )));
        }
    }

    Ok(())
}
