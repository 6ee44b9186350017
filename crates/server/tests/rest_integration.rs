use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use vulnwatch_engine::audit::MemoryAuditSink;
use vulnwatch_engine::clock::SystemClock;
use vulnwatch_engine::cooldown::MemoryCooldownStore;
use vulnwatch_engine::dispatch::{DispatchCoordinator, InAppDispatcher};
use vulnwatch_engine::inbox::{AllowAll, MemoryNotificationStore};
use vulnwatch_engine::rules::RuleStore;
use vulnwatch_engine::{EngineConfig, RuleEngine};
use vulnwatch_server::broker::InMemoryPublisher;
use vulnwatch_server::metrics::ServiceMetrics;
use vulnwatch_server::rest::{router, AppState};

fn app_state() -> (AppState, InMemoryPublisher) {
    let audit = Arc::new(MemoryAuditSink::new());
    let clock = Arc::new(SystemClock);
    let inbox = Arc::new(MemoryNotificationStore::new());
    let coordinator = DispatchCoordinator::new(audit.clone(), clock.clone())
        .register(Arc::new(InAppDispatcher::new(inbox, Arc::new(AllowAll))));

    let engine = Arc::new(RuleEngine::new(
        RuleStore::new(),
        Arc::new(MemoryCooldownStore::new()),
        Arc::new(coordinator),
        audit,
        clock,
        EngineConfig::default(),
    ));

    let publisher = InMemoryPublisher::new();
    (
        AppState {
            engine,
            publisher: Arc::new(publisher.clone()),
            metrics: ServiceMetrics::new(),
        },
        publisher,
    )
}

fn app() -> axum::Router {
    router(app_state().0)
}

fn rule_body() -> serde_json::Value {
    serde_json::json!({
        "owner_id": "owner-1",
        "name": "critical vulns",
        "conditions": [
            { "field": "severity", "operator": "equals", "value": "critical" }
        ],
        "actions": [
            { "channel": "in-app", "config": {} }
        ],
        "cooldown_minutes": 60
    })
}

fn vuln_body() -> serde_json::Value {
    serde_json::json!({
        "id": "v-1",
        "cve_id": "CVE-2024-0001",
        "title": "Remote code execution",
        "severity": "critical",
        "cvss_score": 9.8,
        "observed_at_ms": 1_700_000_000_000i64
    })
}

async fn post(app: axum::Router, uri: &str, body: &serde_json::Value) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn healthz_returns_ok() {
    let resp = app()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn ready_returns_ok() {
    let resp = app()
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_rule_and_list() {
    let (state, _) = app_state();

    let resp = post(router(state.clone()), "/v1/rules", &rule_body()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = json_body(resp).await;
    assert_eq!(created["name"], "critical vulns");
    assert_eq!(created["trigger_count"], 0);

    let resp2 = router(state)
        .oneshot(Request::builder().uri("/v1/rules").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let rules = json_body(resp2).await;
    assert_eq!(rules.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn create_rule_empty_conditions_rejected_with_reason() {
    let mut body = rule_body();
    body["conditions"] = serde_json::json!([]);

    let resp = post(app(), "/v1/rules", &body).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let error = json_body(resp).await;
    assert_eq!(error["field"], "conditions");
}

#[tokio::test]
async fn create_rule_bad_slack_url_rejected() {
    let mut body = rule_body();
    body["actions"] = serde_json::json!([
        { "channel": "slack", "config": { "webhook_url": "https://example.com" } }
    ]);

    let resp = post(app(), "/v1/rules", &body).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let error = json_body(resp).await;
    assert_eq!(error["field"], "actions");
}

#[tokio::test]
async fn list_rules_filtered_by_owner() {
    let (state, _) = app_state();
    post(router(state.clone()), "/v1/rules", &rule_body()).await;

    let mut other = rule_body();
    other["owner_id"] = serde_json::json!("owner-2");
    post(router(state.clone()), "/v1/rules", &other).await;

    let resp = router(state)
        .oneshot(
            Request::builder()
                .uri("/v1/rules?owner_id=owner-2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let rules = json_body(resp).await;
    assert_eq!(rules.as_array().unwrap().len(), 1);
    assert_eq!(rules[0]["owner_id"], "owner-2");
}

#[tokio::test]
async fn get_rule_not_found() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/v1/rules/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_rule_preserves_created_at_and_count() {
    let (state, _) = app_state();
    let created = json_body(post(router(state.clone()), "/v1/rules", &rule_body()).await).await;
    let rule_id = created["id"].as_str().unwrap();

    let update = serde_json::json!({ "name": "renamed", "cooldown_minutes": 15 });
    let resp = router(state)
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/v1/rules/{rule_id}"))
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&update).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let updated = json_body(resp).await;
    assert_eq!(updated["name"], "renamed");
    assert_eq!(updated["cooldown_minutes"], 15);
    assert_eq!(updated["created_at_ms"], created["created_at_ms"]);
    assert_eq!(updated["trigger_count"], 0);
}

#[tokio::test]
async fn delete_rule_then_404() {
    let (state, _) = app_state();
    let created = json_body(post(router(state.clone()), "/v1/rules", &rule_body()).await).await;
    let rule_id = created["id"].as_str().unwrap();

    let resp = router(state.clone())
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/rules/{rule_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp2 = router(state)
        .oneshot(
            Request::builder()
                .uri(format!("/v1/rules/{rule_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp2.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ingest_publishes_and_returns_accepted() {
    let (state, publisher) = app_state();

    let resp = post(router(state), "/v1/vulnerabilities", &vuln_body()).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let body = json_body(resp).await;
    assert_eq!(body["accepted"], true);

    let published = publisher.published_vulnerabilities().await;
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].id, "v-1");
}

#[tokio::test]
async fn ingest_rejects_missing_identifiers() {
    let mut body = vuln_body();
    body["id"] = serde_json::json!("");

    let resp = post(app(), "/v1/vulnerabilities", &body).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn evaluate_returns_dispatch_outcome() {
    let (state, _) = app_state();
    post(router(state.clone()), "/v1/rules", &rule_body()).await;

    let resp = post(router(state), "/v1/vulnerabilities/evaluate", &vuln_body()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let outcomes = json_body(resp).await;
    assert_eq!(outcomes.as_array().unwrap().len(), 1);
    assert_eq!(outcomes[0]["status"], "dispatched");
    assert_eq!(outcomes[0]["result"]["channel_results"][0]["success"], true);
}

#[tokio::test]
async fn rule_status_reflects_trigger() {
    let (state, _) = app_state();
    let created = json_body(post(router(state.clone()), "/v1/rules", &rule_body()).await).await;
    let rule_id = created["id"].as_str().unwrap().to_string();

    post(router(state.clone()), "/v1/vulnerabilities/evaluate", &vuln_body()).await;

    let resp = router(state)
        .oneshot(
            Request::builder()
                .uri(format!("/v1/rules/{rule_id}/status"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let status = json_body(resp).await;
    assert_eq!(status["trigger_count"], 1);
    assert_eq!(status["in_flight"], false);
    assert!(status["last_triggered_at_ms"].is_i64());
    assert_eq!(status["latest_result"]["rule_id"], rule_id);
}

#[tokio::test]
async fn notifier_test_endpoint_validates_shape() {
    let body = serde_json::json!({
        "channel": "webhook",
        "config": { "url": "https://example.com/hook", "method": "POST" }
    });
    let resp = post(app(), "/v1/notifiers/test", &body).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let result = json_body(resp).await;
    assert_eq!(result["success"], true);

    let bad = serde_json::json!({
        "channel": "webhook",
        "config": { "url": "ftp://example.com" }
    });
    let resp2 = post(app(), "/v1/notifiers/test", &bad).await;
    let result2 = json_body(resp2).await;
    assert_eq!(result2["success"], false);
}

#[tokio::test]
async fn metrics_endpoint_renders_counters() {
    let (state, _) = app_state();
    post(router(state.clone()), "/v1/rules", &rule_body()).await;
    post(router(state.clone()), "/v1/vulnerabilities/evaluate", &vuln_body()).await;

    let resp = router(state)
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("vulnwatch_evaluation_rounds_total 1"));
    assert!(text.contains("vulnwatch_dispatch_rounds_total 1"));
    assert!(text.contains("vulnwatch_channel_success_total{channel=\"in-app\"} 1"));
}
