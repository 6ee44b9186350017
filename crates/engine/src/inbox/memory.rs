use std::sync::Arc;
use tokio::sync::Mutex;

use super::{InboxError, Notification, NotificationStore};

#[derive(Clone, Default)]
pub struct MemoryNotificationStore {
    rows: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<Notification> {
        self.rows.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn append(&self, notification: &Notification) -> Result<(), InboxError> {
        self.rows.lock().await.push(notification.clone());
        Ok(())
    }

    async fn list_for_owner(
        &self,
        owner_id: &str,
        limit: i64,
    ) -> Result<Vec<Notification>, InboxError> {
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .rev()
            .filter(|n| n.owner_id == owner_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}
