use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use vulnwatch_common::dispatch_id;
use vulnwatch_common::vuln::Vulnerability;

use crate::audit::AuditSink;
use crate::clock::Clock;
use crate::cooldown::{Acquisition, CooldownStore};
use crate::dispatch::{DispatchCoordinator, DispatchIntent, DispatchResult};
use crate::rules::{evaluate, AlertRule, RuleStore};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on rules evaluated concurrently for one vulnerability.
    pub max_concurrent_rules: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_rules: 16,
        }
    }
}

/// Per-rule outcome of one evaluation round. Non-matching rules produce
/// nothing; everything past the match check is reported.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleOutcome {
    Dispatched {
        rule_id: String,
        result: DispatchResult,
    },
    Throttled {
        rule_id: String,
    },
    InFlight {
        rule_id: String,
    },
    Failed {
        rule_id: String,
        stage: &'static str,
        error: String,
    },
}

impl RuleOutcome {
    pub fn rule_id(&self) -> &str {
        match self {
            Self::Dispatched { rule_id, .. }
            | Self::Throttled { rule_id }
            | Self::InFlight { rule_id }
            | Self::Failed { rule_id, .. } => rule_id,
        }
    }

    pub fn dispatched(&self) -> bool {
        matches!(self, Self::Dispatched { .. })
    }
}

/// Snapshot of a rule's dispatch history for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RuleStatus {
    pub rule_id: String,
    pub trigger_count: u64,
    pub last_triggered_at_ms: Option<i64>,
    pub in_flight: bool,
    pub latest_result: Option<DispatchResult>,
}

/// Drives the full pipeline for each observed vulnerability: active-rule
/// listing, condition evaluation, cooldown acquisition, channel fan-out and
/// post-dispatch bookkeeping. Rules run concurrently under a semaphore;
/// failures in one rule never affect its siblings.
pub struct RuleEngine {
    rules: RuleStore,
    cooldowns: Arc<dyn CooldownStore>,
    coordinator: Arc<DispatchCoordinator>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
    limiter: Arc<Semaphore>,
}

impl RuleEngine {
    pub fn new(
        rules: RuleStore,
        cooldowns: Arc<dyn CooldownStore>,
        coordinator: Arc<DispatchCoordinator>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            rules,
            cooldowns,
            coordinator,
            audit,
            clock,
            limiter: Arc::new(Semaphore::new(config.max_concurrent_rules.max(1))),
        }
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    pub fn cooldowns(&self) -> &Arc<dyn CooldownStore> {
        &self.cooldowns
    }

    /// Evaluates every active rule (optionally scoped to one owner) against
    /// the vulnerability. Returns one outcome per matching rule.
    pub async fn on_vulnerability(
        self: &Arc<Self>,
        vuln: &Vulnerability,
        owner_id: Option<&str>,
    ) -> Vec<RuleOutcome> {
        let candidates = self.rules.list_active(owner_id);
        let mut handles = Vec::with_capacity(candidates.len());

        for rule in candidates {
            let engine = Arc::clone(self);
            let vuln = vuln.clone();
            handles.push(tokio::spawn(async move {
                let _permit = engine
                    .limiter
                    .acquire()
                    .await
                    .map_err(|e| e.to_string())?;
                Ok::<_, String>(engine.process_rule(rule, vuln).await)
            }));
        }

        let mut outcomes = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(Ok(Some(outcome))) => outcomes.push(outcome),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "rule evaluation permit lost"),
                Err(e) => tracing::error!(error = %e, "rule evaluation task aborted"),
            }
        }
        outcomes
    }

    async fn process_rule(&self, rule: AlertRule, vuln: Vulnerability) -> Option<RuleOutcome> {
        let matched = evaluate(&vuln, &rule.conditions);
        if !matched.matched {
            return None;
        }

        let now_ms = self.clock.now_ms();
        let acquisition = match self
            .cooldowns
            .try_acquire(&rule.id, rule.cooldown_minutes, now_ms)
            .await
        {
            Ok(a) => a,
            // Fail closed: an unreadable cooldown state must never produce a
            // duplicate notification.
            Err(e) => {
                tracing::error!(rule_id = %rule.id, error = %e, "cooldown acquire failed");
                return Some(RuleOutcome::Failed {
                    rule_id: rule.id,
                    stage: "cooldown",
                    error: e.to_string(),
                });
            }
        };

        match acquisition {
            Acquisition::Throttled => {
                tracing::debug!(rule_id = %rule.id, vuln_id = %vuln.id, "cooldown window active");
                return Some(RuleOutcome::Throttled { rule_id: rule.id });
            }
            Acquisition::InFlight => {
                tracing::debug!(rule_id = %rule.id, vuln_id = %vuln.id, "dispatch already in flight");
                return Some(RuleOutcome::InFlight { rule_id: rule.id });
            }
            Acquisition::Acquired => {}
        }

        let intent = DispatchIntent {
            dispatch_id: dispatch_id::mint(),
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            owner_id: rule.owner_id.clone(),
            vulnerability: vuln.clone(),
            matched_conditions: matched.matched_clauses,
            generated_at_ms: now_ms,
        };

        match self.coordinator.dispatch(&intent, &rule).await {
            Ok(result) => {
                // The round completed and its audit record exists; stamp the
                // window and count the trigger even if some channels failed.
                let completed_at = result.completed_at_ms;
                if let Err(e) = self.cooldowns.mark_triggered(&rule.id, completed_at).await {
                    tracing::error!(
                        rule_id = %rule.id,
                        error = %e,
                        "mark_triggered failed after audited dispatch, window not stamped"
                    );
                }
                self.rules.record_trigger(&rule.id);
                tracing::info!(
                    rule_id = %rule.id,
                    dispatch_id = %result.dispatch_id,
                    vuln_id = %vuln.id,
                    channels = result.channel_results.len(),
                    all_succeeded = result.all_succeeded(),
                    "dispatch round completed"
                );
                Some(RuleOutcome::Dispatched {
                    rule_id: rule.id,
                    result,
                })
            }
            Err(e) => {
                // Nothing was audited, so the round does not count: free the
                // guard without stamping the window.
                if let Err(release_err) = self.cooldowns.release(&rule.id).await {
                    tracing::error!(rule_id = %rule.id, error = %release_err, "cooldown release failed");
                }
                tracing::error!(rule_id = %rule.id, error = %e, "dispatch round failed");
                Some(RuleOutcome::Failed {
                    rule_id: rule.id,
                    stage: "dispatch",
                    error: e.to_string(),
                })
            }
        }
    }

    pub async fn rule_status(&self, rule_id: &str) -> Option<RuleStatus> {
        let rule = self.rules.get(rule_id)?;
        let state = self.cooldowns.state(rule_id).await.ok().flatten();
        let latest_result = self.audit.latest_for_rule(rule_id).await.ok().flatten();
        Some(RuleStatus {
            rule_id: rule.id,
            trigger_count: rule.trigger_count,
            last_triggered_at_ms: state.as_ref().and_then(|s| s.last_triggered_at_ms),
            in_flight: state.map(|s| s.in_flight).unwrap_or(false),
            latest_result,
        })
    }
}
