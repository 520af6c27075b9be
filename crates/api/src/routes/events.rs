//! Event log inspection and change notifications.

use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use event_store::{EventEnvelope, EventQuery, EventStore};
use futures_util::stream::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;

use crate::AppState;
use crate::error::ApiError;

/// Upper bound for `limit` on one page of events.
const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct EventsParams {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Response type for event envelope data.
#[derive(Serialize)]
pub struct EventEnvelopeResponse {
    pub id: String,
    pub version: i64,
    pub time: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: serde_json::Value,
}

impl From<EventEnvelope> for EventEnvelopeResponse {
    fn from(e: EventEnvelope) -> Self {
        Self {
            id: e.event_id.to_string(),
            version: e.version.as_i64(),
            time: e.timestamp.to_rfc3339(),
            event_type: e.event_type,
            payload: e.payload,
        }
    }
}

/// GET /events: pages through the event log. Admin only.
#[tracing::instrument(skip(state, headers))]
pub async fn list<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Query(params): Query<EventsParams>,
) -> Result<Json<Vec<EventEnvelopeResponse>>, ApiError> {
    state.require_admin(&headers)?;

    let limit = params.limit.unwrap_or(MAX_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let mut query = EventQuery::new().limit(limit);
    if let Some(event_type) = params.event_type {
        query = query.event_type(event_type);
    }
    if let Some(offset) = params.offset {
        query = query.offset(offset);
    }

    let envelopes = state
        .coordinator
        .store()
        .query_events(query)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(envelopes.into_iter().map(Into::into).collect()))
}

/// GET /changes: server-sent events, one per committed event.
///
/// Each message only names the event type and version; clients re-read the
/// state they display.
pub async fn changes<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.coordinator.subscribe();

    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(committed) => {
                    let event = Event::default()
                        .event(committed.event_type)
                        .id(committed.version.to_string())
                        .data(committed.version.to_string());
                    return Some((Ok(event), rx));
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "change listener lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
