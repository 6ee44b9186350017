mod memory;
mod postgres;

pub use memory::MemoryNotificationStore;
pub use postgres::PgNotificationStore;

use serde::{Deserialize, Serialize};

/// One in-app notification row, the record the in-app channel writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub owner_id: String,
    pub rule_id: String,
    pub vulnerability_id: String,
    pub title: String,
    pub body: String,
    pub severity: String,
    pub read: bool,
    pub created_at_ms: i64,
}

#[derive(Debug)]
pub struct InboxError(pub String);

impl std::fmt::Display for InboxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "inbox: {}", self.0)
    }
}

impl std::error::Error for InboxError {}

#[async_trait::async_trait]
pub trait NotificationStore: Send + Sync {
    async fn append(&self, notification: &Notification) -> Result<(), InboxError>;

    async fn list_for_owner(&self, owner_id: &str, limit: i64)
        -> Result<Vec<Notification>, InboxError>;
}

/// Preferences collaborator: may suppress the in-app channel for an owner.
/// Checked by the in-app dispatcher, not by the engine.
#[async_trait::async_trait]
pub trait NotificationPrefs: Send + Sync {
    async fn in_app_enabled(&self, owner_id: &str) -> bool;
}

/// Default preferences when no collaborator is wired: deliver to everyone.
pub struct AllowAll;

#[async_trait::async_trait]
impl NotificationPrefs for AllowAll {
    async fn in_app_enabled(&self, _owner_id: &str) -> bool {
        true
    }
}
