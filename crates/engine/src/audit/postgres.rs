use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use super::{AuditError, AuditSink};
use crate::dispatch::{ChannelResult, DispatchResult};

pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, result: &DispatchResult) -> Result<(), AuditError> {
        let channel_results = serde_json::to_value(&result.channel_results)
            .map_err(|e| AuditError(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO dispatch_results
                   (dispatch_id, rule_id, vulnerability_id, channel_results, completed_at)
               VALUES ($1, $2, $3, $4, to_timestamp($5::double precision / 1000))"#,
        )
        .bind(&result.dispatch_id)
        .bind(&result.rule_id)
        .bind(&result.vulnerability_id)
        .bind(&channel_results)
        .bind(result.completed_at_ms)
        .execute(&self.pool)
        .await
        .map_err(|e| AuditError(e.to_string()))?;
        Ok(())
    }

    async fn latest_for_rule(&self, rule_id: &str) -> Result<Option<DispatchResult>, AuditError> {
        let row = sqlx::query(
            "SELECT dispatch_id, rule_id, vulnerability_id, channel_results, completed_at \
             FROM dispatch_results WHERE rule_id = $1 \
             ORDER BY completed_at DESC LIMIT 1",
        )
        .bind(rule_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuditError(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let channel_results: Vec<ChannelResult> =
            serde_json::from_value(row.get::<serde_json::Value, _>("channel_results"))
                .map_err(|e| AuditError(e.to_string()))?;

        Ok(Some(DispatchResult {
            dispatch_id: row.get("dispatch_id"),
            rule_id: row.get("rule_id"),
            vulnerability_id: row.get("vulnerability_id"),
            channel_results,
            completed_at_ms: row.get::<DateTime<Utc>, _>("completed_at").timestamp_millis(),
        }))
    }
}
