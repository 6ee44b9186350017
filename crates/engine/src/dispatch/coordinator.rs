use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::audit::AuditSink;
use crate::clock::Clock;
use crate::rules::{AlertRule, ChannelKind};

use super::channel::ChannelDispatcher;
use super::result::{ChannelResult, DispatchIntent, DispatchResult};

#[derive(Debug)]
pub struct DispatchError(pub String);

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dispatch: {}", self.0)
    }
}

impl std::error::Error for DispatchError {}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Outer bound per chat/generic webhook channel.
    pub webhook_timeout: Duration,
    /// Email carries a retry budget, so its outer bound is longer.
    pub email_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            webhook_timeout: Duration::from_secs(10),
            email_timeout: Duration::from_secs(60),
        }
    }
}

/// Fans one dispatch intent out to every configured channel concurrently,
/// aggregates the per-channel outcomes, and writes the audit record before
/// returning. The coordinator itself only fails when the audit write fails;
/// channel errors, timeouts and panics all fold into `ChannelResult` entries.
pub struct DispatchCoordinator {
    dispatchers: HashMap<ChannelKind, Arc<dyn ChannelDispatcher>>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
    config: CoordinatorConfig,
}

impl DispatchCoordinator {
    pub fn new(audit: Arc<dyn AuditSink>, clock: Arc<dyn Clock>) -> Self {
        Self {
            dispatchers: HashMap::new(),
            audit,
            clock,
            config: CoordinatorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn register(mut self, dispatcher: Arc<dyn ChannelDispatcher>) -> Self {
        self.dispatchers.insert(dispatcher.kind(), dispatcher);
        self
    }

    fn timeout_for(&self, kind: ChannelKind) -> Duration {
        match kind {
            ChannelKind::Email => self.config.email_timeout,
            _ => self.config.webhook_timeout,
        }
    }

    pub async fn dispatch(
        &self,
        intent: &DispatchIntent,
        rule: &AlertRule,
    ) -> Result<DispatchResult, DispatchError> {
        let mut handles = Vec::with_capacity(rule.actions.len());

        for action in &rule.actions {
            let kind = action.kind();
            match self.dispatchers.get(&kind) {
                Some(dispatcher) => {
                    let dispatcher = dispatcher.clone();
                    let intent = intent.clone();
                    let action = action.clone();
                    let timeout = self.timeout_for(kind);
                    handles.push((
                        kind,
                        Some(tokio::spawn(async move {
                            tokio::time::timeout(timeout, dispatcher.send(&intent, &action)).await
                        })),
                    ));
                }
                None => {
                    tracing::warn!(
                        channel = %kind,
                        rule_id = %rule.id,
                        "no dispatcher wired for channel, recording skip"
                    );
                    handles.push((kind, None));
                }
            }
        }

        // Await in configuration order so channel_results stays aligned with
        // the rule's actions. Each task has its own timeout; a slow channel
        // never delays a sibling's execution, only the aggregation.
        let mut channel_results = Vec::with_capacity(handles.len());
        for (kind, handle) in handles {
            let result = match handle {
                None => ChannelResult::skipped(kind),
                Some(handle) => match handle.await {
                    Ok(Ok(result)) => result,
                    Ok(Err(_elapsed)) => {
                        let timeout = self.timeout_for(kind);
                        ChannelResult::failed(
                            kind,
                            kind.as_str(),
                            0,
                            timeout.as_millis() as u64,
                            format!("timed out after {}ms", timeout.as_millis()),
                        )
                    }
                    Err(join_err) => ChannelResult::failed(
                        kind,
                        kind.as_str(),
                        0,
                        0,
                        format!("channel task aborted: {join_err}"),
                    ),
                },
            };
            channel_results.push(result);
        }

        let result = DispatchResult {
            dispatch_id: intent.dispatch_id.clone(),
            rule_id: intent.rule_id.clone(),
            vulnerability_id: intent.vulnerability.id.clone(),
            channel_results,
            completed_at_ms: self.clock.now_ms(),
        };

        // Audit write happens-before returning: the engine only marks the
        // cooldown and bumps the trigger counter once this record exists.
        self.audit
            .record(&result)
            .await
            .map_err(|e| DispatchError(e.to_string()))?;

        Ok(result)
    }
}
