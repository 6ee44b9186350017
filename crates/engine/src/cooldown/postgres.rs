use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use super::{Acquisition, CooldownError, CooldownState, CooldownStore};

const TRY_ACQUIRE_SQL: &str = r#"INSERT INTO cooldown_states
       (rule_id, last_triggered_at, in_flight, in_flight_since)
   VALUES ($1, NULL, TRUE, to_timestamp($2::double precision / 1000))
   ON CONFLICT (rule_id) DO UPDATE
   SET in_flight = TRUE,
       in_flight_since = to_timestamp($2::double precision / 1000)
   WHERE (cooldown_states.in_flight = FALSE
          OR cooldown_states.in_flight_since
             < to_timestamp($2::double precision / 1000) - make_interval(secs => $3::int))
     AND (cooldown_states.last_triggered_at IS NULL
          OR cooldown_states.last_triggered_at
             <= to_timestamp($2::double precision / 1000) - make_interval(mins => $4::int))"#;

/// Postgres cooldown store. The CAS is a single conditional upsert: the
/// statement only takes the in-flight guard when the guard is clear and the
/// window has elapsed, so concurrent triggers of the same rule race on one
/// row-level lock and exactly one wins. A guard older than the stale TTL is
/// taken over so an aborted process cannot wedge its rule.
pub struct PgCooldownStore {
    pool: PgPool,
    stale_in_flight_secs: i64,
}

impl PgCooldownStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            stale_in_flight_secs: 300,
        }
    }

    pub fn with_stale_takeover_secs(mut self, secs: i64) -> Self {
        self.stale_in_flight_secs = secs;
        self
    }
}

#[async_trait::async_trait]
impl CooldownStore for PgCooldownStore {
    async fn try_acquire(
        &self,
        rule_id: &str,
        cooldown_minutes: i64,
        now_ms: i64,
    ) -> Result<Acquisition, CooldownError> {
        let result = sqlx::query(TRY_ACQUIRE_SQL)
            .bind(rule_id)
            .bind(now_ms)
            .bind(self.stale_in_flight_secs as i32)
            .bind(cooldown_minutes as i32)
            .execute(&self.pool)
            .await
            .map_err(|e| CooldownError(e.to_string()))?;

        if result.rows_affected() == 1 {
            return Ok(Acquisition::Acquired);
        }

        // Lost the race or inside the window; read back only to attribute the
        // skip in the outcome report.
        let row = sqlx::query("SELECT in_flight FROM cooldown_states WHERE rule_id = $1")
            .bind(rule_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CooldownError(e.to_string()))?;

        match row {
            Some(row) if row.get::<bool, _>("in_flight") => Ok(Acquisition::InFlight),
            _ => Ok(Acquisition::Throttled),
        }
    }

    async fn release(&self, rule_id: &str) -> Result<(), CooldownError> {
        sqlx::query(
            "UPDATE cooldown_states SET in_flight = FALSE, in_flight_since = NULL \
             WHERE rule_id = $1",
        )
        .bind(rule_id)
        .execute(&self.pool)
        .await
        .map_err(|e| CooldownError(e.to_string()))?;
        Ok(())
    }

    async fn mark_triggered(&self, rule_id: &str, now_ms: i64) -> Result<(), CooldownError> {
        sqlx::query(
            r#"INSERT INTO cooldown_states
                   (rule_id, last_triggered_at, in_flight, in_flight_since)
               VALUES ($1, to_timestamp($2::double precision / 1000), FALSE, NULL)
               ON CONFLICT (rule_id) DO UPDATE
               SET last_triggered_at = EXCLUDED.last_triggered_at,
                   in_flight = FALSE,
                   in_flight_since = NULL"#,
        )
        .bind(rule_id)
        .bind(now_ms)
        .execute(&self.pool)
        .await
        .map_err(|e| CooldownError(e.to_string()))?;
        Ok(())
    }

    async fn state(&self, rule_id: &str) -> Result<Option<CooldownState>, CooldownError> {
        let row = sqlx::query(
            "SELECT last_triggered_at, in_flight FROM cooldown_states WHERE rule_id = $1",
        )
        .bind(rule_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CooldownError(e.to_string()))?;

        Ok(row.map(|row| CooldownState {
            rule_id: rule_id.to_string(),
            last_triggered_at_ms: row
                .get::<Option<DateTime<Utc>>, _>("last_triggered_at")
                .map(|t| t.timestamp_millis()),
            in_flight: row.get("in_flight"),
        }))
    }

    async fn remove(&self, rule_id: &str) -> Result<(), CooldownError> {
        sqlx::query("DELETE FROM cooldown_states WHERE rule_id = $1")
            .bind(rule_id)
            .execute(&self.pool)
            .await
            .map_err(|e| CooldownError(e.to_string()))?;
        Ok(())
    }
}
