//! HTTP API server for the bidding round.
//!
//! Provides JSON endpoints for participants and the administrator on top of
//! the domain [`Coordinator`], with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::routing::{delete, get, post, put};
use domain::{Coordinator, Model, ModelEvent};
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: EventStore> {
    pub coordinator: Arc<Coordinator<S>>,
    pub admin_token: String,
}

impl<S: EventStore + 'static> AppState<S> {
    pub fn new(coordinator: Coordinator<S>, admin_token: impl Into<String>) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            admin_token: admin_token.into(),
        }
    }

    /// Returns true if the request carries the admin bearer token.
    pub fn is_admin(&self, headers: &HeaderMap) -> bool {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| constant_time_eq(token.trim(), &self.admin_token))
    }

    /// Fails with 401 unless the request is an admin request.
    pub fn require_admin(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        if self.is_admin(headers) {
            Ok(())
        } else {
            metrics::counter!("admin_auth_failures_total").increment(1);
            Err(ApiError::Unauthorized)
        }
    }

    /// Builds one event from the current model and commits it.
    ///
    /// Once the event is accepted the commit finishes even if the client
    /// hangs up.
    pub async fn commit<F>(&self, build: F) -> Result<ModelEvent, ApiError>
    where
        F: FnOnce(&Model) -> Result<ModelEvent, ApiError>,
    {
        self.coordinator.execute(build).await
    }

    /// Like [`commit`](Self::commit), building the response from the model
    /// the event produced. A writer that commits right after cannot change
    /// what `view` sees.
    pub async fn commit_with<F, V, T>(&self, build: F, view: V) -> Result<T, ApiError>
    where
        F: FnOnce(&Model) -> Result<ModelEvent, ApiError>,
        V: FnOnce(&ModelEvent, &Model) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        self.coordinator.execute_with(build, view).await?
    }
}

/// Compares two tokens in time that depends only on their lengths.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EventStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route(
            "/phase",
            get(routes::phase::get::<S>).put(routes::phase::set::<S>),
        )
        .route(
            "/bidders",
            get(routes::bidders::list::<S>).post(routes::bidders::create::<S>),
        )
        .route(
            "/bidders/{id}",
            get(routes::bidders::get::<S>)
                .put(routes::bidders::update::<S>)
                .delete(routes::bidders::remove::<S>),
        )
        .route(
            "/bidders/{id}/contract",
            post(routes::bidders::accept_contract::<S>),
        )
        .route("/bidders/{id}/bid", put(routes::bidders::set_bid::<S>))
        .route(
            "/bidders/{id}/present",
            put(routes::bidders::set_present::<S>),
        )
        .route(
            "/bidders/{id}/self-edit",
            put(routes::bidders::set_self_edit::<S>),
        )
        .route("/bids", delete(routes::bidders::reset_bids::<S>))
        .route("/events", get(routes::events::list::<S>))
        .route("/changes", get(routes::events::changes::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use event_store::InMemoryEventStore;

    use super::*;

    async fn state() -> AppState<InMemoryEventStore> {
        let coordinator = Coordinator::load(InMemoryEventStore::new()).await.unwrap();
        AppState::new(coordinator, "s3cret")
    }

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(authorization).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_admin_token_must_match() {
        let state = state().await;

        assert!(state.is_admin(&headers("Bearer s3cret")));
        assert!(!state.is_admin(&headers("Bearer wrong")));
        assert!(!state.is_admin(&headers("s3cret")));
        assert!(!state.is_admin(&HeaderMap::new()));
        assert!(matches!(
            state.require_admin(&HeaderMap::new()),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("s3cret", "s3cret"));
        assert!(!constant_time_eq("s3cret", "s3creT"));
        assert!(!constant_time_eq("s3cret", "s3cret2"));
        assert!(!constant_time_eq("", "s3cret"));
        assert!(constant_time_eq("", ""));
    }

    #[tokio::test]
    async fn test_commit_applies_event() {
        let state = state().await;

        let event = state.commit(|m| Ok(m.create_bidder())).await.unwrap();

        let id = event.bidder_id().unwrap();
        assert!(state.coordinator.read().await.contains(id));
    }

    #[tokio::test]
    async fn test_commit_build_error_commits_nothing() {
        let state = state().await;

        let result = state
            .commit(|_| Err(ApiError::Forbidden("no".to_string())))
            .await;

        assert!(matches!(result, Err(ApiError::Forbidden(_))));
        assert_eq!(state.coordinator.read().await.bidder_count(), 0);
    }

    #[tokio::test]
    async fn test_commit_with_view_sees_own_commit() {
        let state = Arc::new(state().await);
        let event = state.commit(|m| Ok(m.create_bidder())).await.unwrap();
        let id = event.bidder_id().unwrap();

        // Queue a presence update and then a delete behind a held lock.
        let section = state.coordinator.write().await;
        let present = {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                state
                    .commit_with(
                        move |m| Ok(m.set_present(id, true)),
                        move |_, m| {
                            m.bidder(id)
                                .map(|b| b.present)
                                .ok_or_else(|| ApiError::NotFound(id.to_string()))
                        },
                    )
                    .await
            })
        };
        tokio::task::yield_now().await;
        let remove = {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.commit(move |m| Ok(m.delete_bidder(id))).await })
        };
        tokio::task::yield_now().await;
        section.release();

        assert!(present.await.unwrap().unwrap());
        remove.await.unwrap().unwrap();
        assert!(!state.coordinator.read().await.contains(id));
    }

    #[tokio::test]
    async fn test_commit_with_view_error_is_returned() {
        let state = state().await;

        let result: Result<(), _> = state
            .commit_with(
                |m| Ok(m.create_bidder()),
                |_, _| Err(ApiError::Internal("view failed".to_string())),
            )
            .await;

        assert!(matches!(result, Err(ApiError::Internal(_))));
        assert_eq!(state.coordinator.read().await.bidder_count(), 1);
    }
}
