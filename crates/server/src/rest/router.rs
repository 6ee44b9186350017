use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use vulnwatch_engine::RuleEngine;

use super::{health, metrics, notifiers, rules, vulns};
use crate::broker::EventPublisher;
use crate::metrics::ServiceMetrics;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RuleEngine>,
    pub publisher: Arc<dyn EventPublisher>,
    pub metrics: Arc<ServiceMetrics>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/ready", get(health::ready))
        .route("/metrics", get(metrics::metrics))
        .route("/v1/rules", get(rules::list_rules).post(rules::create_rule))
        .route(
            "/v1/rules/{rule_id}",
            get(rules::get_rule)
                .put(rules::update_rule)
                .delete(rules::delete_rule),
        )
        .route("/v1/rules/{rule_id}/status", get(rules::rule_status))
        .route("/v1/vulnerabilities", post(vulns::ingest))
        .route("/v1/vulnerabilities/evaluate", post(vulns::evaluate))
        .route("/v1/notifiers/test", post(notifiers::test_notifier))
        .with_state(state)
}
