use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{AuditError, AuditSink};
use crate::dispatch::DispatchResult;

/// Recording sink for tests and single-process deployments. Can be flipped
/// into a failing state to exercise the fail-closed path.
#[derive(Clone, Default)]
pub struct MemoryAuditSink {
    records: Arc<Mutex<Vec<DispatchResult>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn recorded(&self) -> Vec<DispatchResult> {
        self.records.lock().await.clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, result: &DispatchResult) -> Result<(), AuditError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AuditError("sink unavailable".into()));
        }
        self.records.lock().await.push(result.clone());
        Ok(())
    }

    async fn latest_for_rule(&self, rule_id: &str) -> Result<Option<DispatchResult>, AuditError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AuditError("sink unavailable".into()));
        }
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .rev()
            .find(|r| r.rule_id == rule_id)
            .cloned())
    }
}
