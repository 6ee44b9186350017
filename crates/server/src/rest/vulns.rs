use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use vulnwatch_common::vuln::Vulnerability;
use vulnwatch_engine::RuleOutcome;

use crate::rest::AppState;

#[derive(Deserialize)]
pub struct EvaluateParams {
    pub owner_id: Option<String>,
}

#[derive(Serialize)]
pub struct IngestResponse {
    pub id: String,
    pub accepted: bool,
}

/// Async ingestion path: the record goes onto the event stream and the
/// consumer feeds it through the engine.
pub async fn ingest(
    State(state): State<AppState>,
    Json(vuln): Json<Vulnerability>,
) -> Result<(StatusCode, Json<IngestResponse>), (StatusCode, String)> {
    if vuln.id.trim().is_empty() || vuln.cve_id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "id and cve_id are required".into(),
        ));
    }

    state
        .publisher
        .publish_vulnerability(&vuln)
        .await
        .map_err(|e| {
            tracing::error!(vuln_id = %vuln.id, error = %e, "vulnerability publish failed");
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        })?;

    state.metrics.inc_vulns_ingested();
    Ok((
        StatusCode::ACCEPTED,
        Json(IngestResponse {
            id: vuln.id,
            accepted: true,
        }),
    ))
}

/// Sync path for manual and test triggers: evaluates in-process and returns
/// the per-rule outcomes directly.
pub async fn evaluate(
    State(state): State<AppState>,
    Query(params): Query<EvaluateParams>,
    Json(vuln): Json<Vulnerability>,
) -> Json<Vec<RuleOutcome>> {
    let start = Instant::now();
    let outcomes = state
        .engine
        .on_vulnerability(&vuln, params.owner_id.as_deref())
        .await;
    state.metrics.record_eval_latency(start);
    state.metrics.record_outcomes(&outcomes);
    Json(outcomes)
}
