mod memory;
mod postgres;

pub use memory::MemoryAuditSink;
pub use postgres::PgAuditSink;

use crate::dispatch::DispatchResult;

#[derive(Debug)]
pub struct AuditError(pub String);

impl std::fmt::Display for AuditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "audit: {}", self.0)
    }
}

impl std::error::Error for AuditError {}

/// Append-only audit trail of dispatch rounds. The coordinator writes here
/// before handing control back, so a round without an audit record never
/// counts as triggered.
#[async_trait::async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, result: &DispatchResult) -> Result<(), AuditError>;

    async fn latest_for_rule(&self, rule_id: &str) -> Result<Option<DispatchResult>, AuditError>;
}
