use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use vulnwatch_engine::rules::{
    validate_rule, AlertRule, ChannelAction, ConditionClause, ValidationError,
};
use vulnwatch_engine::RuleStatus;

use crate::rest::AppState;

#[derive(Deserialize)]
pub struct CreateRuleRequest {
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub conditions: Vec<ConditionClause>,
    pub actions: Vec<ChannelAction>,
    pub cooldown_minutes: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateRuleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub conditions: Option<Vec<ConditionClause>>,
    pub actions: Option<Vec<ChannelAction>>,
    pub cooldown_minutes: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub owner_id: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub field: String,
    pub reason: String,
}

type Rejection = (StatusCode, Json<ErrorBody>);

fn bad_request(err: ValidationError) -> Rejection {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            field: err.field.to_string(),
            reason: err.reason,
        }),
    )
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

pub async fn list_rules(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<AlertRule>> {
    let rules = match params.owner_id.as_deref() {
        Some(owner) => state.engine.rules().list_by_owner(owner),
        None => state.engine.rules().list(),
    };
    Json(rules)
}

pub async fn get_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<String>,
) -> Result<Json<AlertRule>, StatusCode> {
    state
        .engine
        .rules()
        .get(&rule_id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn create_rule(
    State(state): State<AppState>,
    Json(body): Json<CreateRuleRequest>,
) -> Result<(StatusCode, Json<AlertRule>), Rejection> {
    let cooldown_minutes = body.cooldown_minutes.unwrap_or(0);
    validate_rule(&body.name, &body.conditions, &body.actions, cooldown_minutes)
        .map_err(bad_request)?;

    let now = now_ms();
    let rule = AlertRule {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: body.owner_id,
        name: body.name,
        description: body.description.unwrap_or_default(),
        conditions: body.conditions,
        actions: body.actions,
        cooldown_minutes,
        is_active: body.is_active.unwrap_or(true),
        trigger_count: 0,
        created_at_ms: now,
        updated_at_ms: now,
    };

    state.engine.rules().insert(rule.clone());
    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn update_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<String>,
    Json(body): Json<UpdateRuleRequest>,
) -> Result<Json<AlertRule>, Rejection> {
    let existing = state
        .engine
        .rules()
        .get(&rule_id)
        .ok_or((
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                field: "rule_id".into(),
                reason: "not found".into(),
            }),
        ))?;

    let updated = AlertRule {
        id: existing.id.clone(),
        owner_id: existing.owner_id.clone(),
        name: body.name.unwrap_or(existing.name),
        description: body.description.unwrap_or(existing.description),
        conditions: body.conditions.unwrap_or(existing.conditions),
        actions: body.actions.unwrap_or(existing.actions),
        cooldown_minutes: body.cooldown_minutes.unwrap_or(existing.cooldown_minutes),
        is_active: body.is_active.unwrap_or(existing.is_active),
        // Trigger bookkeeping is separate state; edits never touch it.
        trigger_count: existing.trigger_count,
        created_at_ms: existing.created_at_ms,
        updated_at_ms: now_ms(),
    };

    validate_rule(
        &updated.name,
        &updated.conditions,
        &updated.actions,
        updated.cooldown_minutes,
    )
    .map_err(bad_request)?;

    state.engine.rules().update(updated.clone());
    Ok(Json(updated))
}

pub async fn delete_rule(State(state): State<AppState>, Path(rule_id): Path<String>) -> StatusCode {
    if state.engine.rules().delete(&rule_id) {
        if let Err(e) = state.engine.cooldowns().remove(&rule_id).await {
            tracing::warn!(rule_id = %rule_id, error = %e, "cooldown cleanup failed");
        }
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn rule_status(
    State(state): State<AppState>,
    Path(rule_id): Path<String>,
) -> Result<Json<RuleStatus>, StatusCode> {
    state
        .engine
        .rule_status(&rule_id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
