use std::sync::Arc;

use vulnwatch_engine::audit::{AuditError, AuditSink};
use vulnwatch_engine::dispatch::DispatchResult;

use super::publisher::EventPublisher;

/// Audit sink decorator that also publishes every recorded round to the
/// audit subject. The inner write is the binding one: a publish failure is
/// logged and swallowed, a write failure propagates and fails the round.
pub struct StreamingAuditSink {
    inner: Arc<dyn AuditSink>,
    publisher: Arc<dyn EventPublisher>,
}

impl StreamingAuditSink {
    pub fn new(inner: Arc<dyn AuditSink>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { inner, publisher }
    }
}

#[async_trait::async_trait]
impl AuditSink for StreamingAuditSink {
    async fn record(&self, result: &DispatchResult) -> Result<(), AuditError> {
        self.inner.record(result).await?;

        if let Err(e) = self.publisher.publish_dispatch(result).await {
            tracing::warn!(
                dispatch_id = %result.dispatch_id,
                error = %e,
                "audit event publish failed, record persisted"
            );
        }
        Ok(())
    }

    async fn latest_for_rule(&self, rule_id: &str) -> Result<Option<DispatchResult>, AuditError> {
        self.inner.latest_for_rule(rule_id).await
    }
}
