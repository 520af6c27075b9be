//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use api::AppState;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain::Coordinator;
use event_store::{FileEventStore, InMemoryEventStore};
use futures_util::StreamExt;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

const ADMIN_TOKEN: &str = "s3cret";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

async fn setup() -> Router {
    setup_with_state().await.0
}

async fn setup_with_state() -> (Router, Arc<AppState<InMemoryEventStore>>) {
    let coordinator = Coordinator::load(InMemoryEventStore::new()).await.unwrap();
    let state = Arc::new(AppState::new(coordinator, ADMIN_TOKEN));
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

/// Sends one request and returns the status with the JSON body (`Null` if empty).
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    admin: bool,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if admin {
        request = request.header("authorization", format!("Bearer {ADMIN_TOKEN}"));
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn register(app: &Router) -> u64 {
    let (status, json) = send(app, "POST", "/bidders", false, None).await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_u64().unwrap()
}

async fn set_phase(app: &Router, phase: &str) {
    let (status, _) = send(app, "PUT", "/phase", true, Some(json!({ "phase": phase }))).await;
    assert_eq!(status, StatusCode::OK);
}

fn complete_form() -> Value {
    json!({
        "first_name": "Anna",
        "last_name": "Müller",
        "email": "anna@example.org",
        "address": "Hauptstraße 1, 78048 Villingen",
        "member": true,
        "distribution_site": "villingen",
        "iban": "de89370400440532013000",
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;

    let (status, json) = send(&app, "GET", "/health", false, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["phase"], "registration");
    assert_eq!(json["version"], 0);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_participant_registers_during_registration() {
    let app = setup().await;

    let (status, json) = send(&app, "POST", "/bidders", false, None).await;

    assert_eq!(status, StatusCode::CREATED);
    let id = json["id"].as_u64().unwrap();
    assert!((100_000..1_000_000).contains(&id));
    assert_eq!(json["bid"], 0);
    assert_eq!(json["can_self_edit"], true);
    assert!(json["invalid_fields"]["email"].is_string());
}

#[tokio::test]
async fn test_registration_closed_after_registration() {
    let app = setup().await;
    set_phase(&app, "offer").await;

    let (status, json) = send(&app, "POST", "/bidders", false, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "Registration is closed");

    let (status, json) = send(&app, "POST", "/bidders", true, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "Registration is closed in phase offer");
}

#[tokio::test]
async fn test_admin_endpoints_require_token() {
    let app = setup().await;

    for (method, uri) in [
        ("GET", "/bidders"),
        ("GET", "/events"),
        ("DELETE", "/bids"),
        ("DELETE", "/bidders/100001"),
    ] {
        let (status, json) = send(&app, method, uri, false, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(json["error"], "Admin token required");
    }

    let (status, _) = send(&app, "PUT", "/phase", false, Some(json!({ "phase": "offer" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_phase_is_rejected() {
    let app = setup().await;

    let (status, json) = send(&app, "PUT", "/phase", true, Some(json!({ "phase": "harvest" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid phase: -");

    let (_, json) = send(&app, "GET", "/phase", false, None).await;
    assert_eq!(json["phase"], "registration");
}

#[tokio::test]
async fn test_participant_completes_registration() {
    let app = setup().await;
    let id = register(&app).await;

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/bidders/{id}"),
        false,
        Some(complete_form()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["full_name"], "Anna Müller");
    assert_eq!(json["iban"], "DE89 3704 0044 0532 0130 00");
    assert_eq!(json["invalid_fields"], json!({}));

    let (status, json) = send(&app, "GET", &format!("/bidders/{id}"), false, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["distribution_site"], "villingen");
}

#[tokio::test]
async fn test_self_edit_during_validation() {
    let app = setup().await;
    let id = register(&app).await;
    set_phase(&app, "validation").await;

    let uri = format!("/bidders/{id}");
    let form = json!({ "phone": "07721 12345" });

    let (status, _) = send(&app, "PUT", &uri, false, Some(form.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/bidders/{id}/self-edit"),
        true,
        Some(json!({ "self_edit": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["can_self_edit"], true);

    let (status, json) = send(&app, "PUT", &uri, false, Some(form)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phone"], "07721 12345");
}

#[tokio::test]
async fn test_bidding_requires_presence() {
    let app = setup().await;
    let id = register(&app).await;
    set_phase(&app, "offer").await;

    let uri = format!("/bidders/{id}/bid");
    let bid = json!({ "bid": "81,50" });

    let (status, _) = send(&app, "PUT", &uri, false, Some(bid.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/bidders/{id}/present"),
        true,
        Some(json!({ "present": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, "PUT", &uri, false, Some(bid)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["bid"], 8150);
    assert_eq!(json["bid_display"], "81,50 €");

    let (status, json) = send(&app, "PUT", &uri, false, Some(json!({ "bid": "81,505" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("Invalid amount"));
}

#[tokio::test]
async fn test_unknown_and_malformed_bidder_ids() {
    let app = setup().await;

    let (status, json) = send(&app, "GET", "/bidders/123456", false, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Bidder 123456 does not exist");

    let (status, _) = send(&app, "GET", "/bidders/abc", false, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/bidders/123456/contract", false, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_accept_contract() {
    let app = setup().await;
    let id = register(&app).await;

    let (status, json) = send(&app, "POST", &format!("/bidders/{id}/contract"), false, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["contract_accepted"], true);
}

#[tokio::test]
async fn test_admin_lists_bidders_sorted_by_name() {
    let app = setup().await;

    for last_name in ["Weber", "Abel", "Müller"] {
        let id = register(&app).await;
        let (status, _) = send(
            &app,
            "PUT",
            &format!("/bidders/{id}"),
            false,
            Some(json!({ "last_name": last_name })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) = send(&app, "GET", "/bidders", true, None).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = json["bidders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["last_name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Abel", "Müller", "Weber"]);
    assert_eq!(json["phase"], "registration");
}

#[tokio::test]
async fn test_delete_bidder_and_reset_bids() {
    let (app, state) = setup_with_state().await;
    let keep = register(&app).await;
    let gone = register(&app).await;
    set_phase(&app, "offer").await;

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/bidders/{keep}/bid"),
        true,
        Some(json!({ "bid": "95" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, "DELETE", &format!("/bidders/{gone}"), true, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(json, Value::Null);

    let (status, _) = send(&app, "GET", &format!("/bidders/{gone}"), false, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/bids", true, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let model = state.coordinator.read().await;
    assert_eq!(model.bidder_count(), 1);
    assert!(model.total_bids().is_zero());
}

#[tokio::test]
async fn test_events_are_listed_in_log_order() {
    let app = setup().await;
    register(&app).await;
    set_phase(&app, "validation").await;
    set_phase(&app, "offer").await;

    let (status, json) = send(&app, "GET", "/events", true, None).await;
    assert_eq!(status, StatusCode::OK);
    let types: Vec<_> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(types, vec!["create-bidder", "set-phase", "set-phase"]);

    let (_, json) = send(&app, "GET", "/events?type=set-phase&offset=1&limit=5", true, None).await;
    let events = json.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["version"], 3);
    assert_eq!(events[0]["payload"], json!({ "phase": "offer" }));
}

#[tokio::test]
async fn test_changes_stream_announces_commits() {
    let app = setup().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/changes")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );

    set_phase(&app, "offer").await;

    let mut body = response.into_body().into_data_stream();
    let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let text = String::from_utf8_lossy(&chunk);
    assert!(text.contains("event:"), "{text}");
    assert!(text.contains("set-phase"), "{text}");
}

#[tokio::test]
async fn test_state_survives_restart_with_file_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.jsonl");

    let id = {
        let coordinator = Coordinator::load(FileEventStore::open(&path).await.unwrap())
            .await
            .unwrap();
        let state = Arc::new(AppState::new(coordinator, ADMIN_TOKEN));
        let app = api::create_app(state, get_metrics_handle());

        let id = register(&app).await;
        let (status, _) = send(
            &app,
            "PUT",
            &format!("/bidders/{id}"),
            false,
            Some(complete_form()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        id
    };

    let coordinator = Coordinator::load(FileEventStore::open(&path).await.unwrap())
        .await
        .unwrap();
    let state = Arc::new(AppState::new(coordinator, ADMIN_TOKEN));
    let app = api::create_app(state, get_metrics_handle());

    let (status, json) = send(&app, "GET", &format!("/bidders/{id}"), false, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["last_name"], "Müller");
    assert_eq!(json["invalid_fields"], json!({}));

    let (_, json) = send(&app, "GET", "/health", false, None).await;
    assert_eq!(json["version"], 2);
}
