use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    EventEnvelope, EventQuery, Result, Version,
    store::{AppendOptions, EventStore, EventStream, validate_events_for_append},
};

/// In-memory event log for tests and benchmarks.
///
/// Provides the same interface as the file-backed log but forgets everything
/// when dropped.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with the given events.
    ///
    /// The events are taken as-is; callers are responsible for sequential versions.
    pub fn with_events(events: Vec<EventEnvelope>) -> Self {
        Self {
            events: Arc::new(RwLock::new(events)),
        }
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }
}

fn version_of(events: &[EventEnvelope]) -> Version {
    events.last().map(|e| e.version).unwrap_or(Version::initial())
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        let mut store = self.events.write().await;

        validate_events_for_append(&events, version_of(&store), &options)?;

        store.extend(events);
        Ok(version_of(&store))
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let events = self.events.read().await.clone();
        let stream = stream::iter(events.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        Ok(query.select(store.iter()))
    }

    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        Ok(store
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect())
    }

    async fn current_version(&self) -> Result<Version> {
        Ok(version_of(&self.events.read().await))
    }
}
