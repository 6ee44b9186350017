use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use super::{InboxError, Notification, NotificationStore};

pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl NotificationStore for PgNotificationStore {
    async fn append(&self, n: &Notification) -> Result<(), InboxError> {
        sqlx::query(
            r#"INSERT INTO notifications
                   (id, owner_id, rule_id, vulnerability_id, title, body, severity, read, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8,
                       to_timestamp($9::double precision / 1000))"#,
        )
        .bind(&n.id)
        .bind(&n.owner_id)
        .bind(&n.rule_id)
        .bind(&n.vulnerability_id)
        .bind(&n.title)
        .bind(&n.body)
        .bind(&n.severity)
        .bind(n.read)
        .bind(n.created_at_ms)
        .execute(&self.pool)
        .await
        .map_err(|e| InboxError(e.to_string()))?;
        Ok(())
    }

    async fn list_for_owner(
        &self,
        owner_id: &str,
        limit: i64,
    ) -> Result<Vec<Notification>, InboxError> {
        let rows = sqlx::query(
            "SELECT id, owner_id, rule_id, vulnerability_id, title, body, severity, read, created_at \
             FROM notifications WHERE owner_id = $1 \
             ORDER BY created_at DESC LIMIT $2",
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| InboxError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| Notification {
                id: row.get("id"),
                owner_id: row.get("owner_id"),
                rule_id: row.get("rule_id"),
                vulnerability_id: row.get("vulnerability_id"),
                title: row.get("title"),
                body: row.get("body"),
                severity: row.get("severity"),
                read: row.get("read"),
                created_at_ms: row.get::<DateTime<Utc>, _>("created_at").timestamp_millis(),
            })
            .collect())
    }
}
