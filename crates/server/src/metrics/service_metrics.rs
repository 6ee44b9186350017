use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use vulnwatch_engine::rules::ChannelKind;
use vulnwatch_engine::RuleOutcome;

/// Per-channel counter pair. Fixed arms instead of a label map: the channel
/// set is closed.
#[derive(Debug, Default)]
pub struct ChannelCounters {
    in_app: AtomicU64,
    email: AtomicU64,
    slack: AtomicU64,
    discord: AtomicU64,
    webhook: AtomicU64,
}

impl ChannelCounters {
    fn slot(&self, kind: ChannelKind) -> &AtomicU64 {
        match kind {
            ChannelKind::InApp => &self.in_app,
            ChannelKind::Email => &self.email,
            ChannelKind::Slack => &self.slack,
            ChannelKind::Discord => &self.discord,
            ChannelKind::Webhook => &self.webhook,
        }
    }

    pub fn inc(&self, kind: ChannelKind) {
        self.slot(kind).fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, kind: ChannelKind) -> u64 {
        self.slot(kind).load(Ordering::Relaxed)
    }
}

pub const ALL_CHANNELS: [ChannelKind; 5] = [
    ChannelKind::InApp,
    ChannelKind::Email,
    ChannelKind::Slack,
    ChannelKind::Discord,
    ChannelKind::Webhook,
];

#[derive(Debug, Default)]
pub struct ServiceMetrics {
    vulns_ingested_total: AtomicU64,
    evaluation_rounds_total: AtomicU64,
    rules_matched_total: AtomicU64,
    dispatch_rounds_total: AtomicU64,
    cooldown_skips_total: AtomicU64,
    round_failures_total: AtomicU64,
    channel_success: ChannelCounters,
    channel_failure: ChannelCounters,
    eval_latency_sum_us: AtomicU64,
    eval_latency_count: AtomicU64,
}

impl ServiceMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_vulns_ingested(&self) {
        self.vulns_ingested_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eval_latency(&self, start: Instant) {
        let us = start.elapsed().as_micros() as u64;
        self.eval_latency_sum_us.fetch_add(us, Ordering::Relaxed);
        self.eval_latency_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Folds one evaluation round's outcomes into the counters.
    pub fn record_outcomes(&self, outcomes: &[RuleOutcome]) {
        self.evaluation_rounds_total.fetch_add(1, Ordering::Relaxed);
        self.rules_matched_total
            .fetch_add(outcomes.len() as u64, Ordering::Relaxed);

        for outcome in outcomes {
            match outcome {
                RuleOutcome::Dispatched { result, .. } => {
                    self.dispatch_rounds_total.fetch_add(1, Ordering::Relaxed);
                    for cr in &result.channel_results {
                        if cr.success {
                            self.channel_success.inc(cr.channel);
                        } else {
                            self.channel_failure.inc(cr.channel);
                        }
                    }
                }
                RuleOutcome::Throttled { .. } | RuleOutcome::InFlight { .. } => {
                    self.cooldown_skips_total.fetch_add(1, Ordering::Relaxed);
                }
                RuleOutcome::Failed { .. } => {
                    self.round_failures_total.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    pub fn vulns_ingested_total(&self) -> u64 {
        self.vulns_ingested_total.load(Ordering::Relaxed)
    }

    pub fn evaluation_rounds_total(&self) -> u64 {
        self.evaluation_rounds_total.load(Ordering::Relaxed)
    }

    pub fn rules_matched_total(&self) -> u64 {
        self.rules_matched_total.load(Ordering::Relaxed)
    }

    pub fn dispatch_rounds_total(&self) -> u64 {
        self.dispatch_rounds_total.load(Ordering::Relaxed)
    }

    pub fn cooldown_skips_total(&self) -> u64 {
        self.cooldown_skips_total.load(Ordering::Relaxed)
    }

    pub fn round_failures_total(&self) -> u64 {
        self.round_failures_total.load(Ordering::Relaxed)
    }

    pub fn channel_success_total(&self, kind: ChannelKind) -> u64 {
        self.channel_success.get(kind)
    }

    pub fn channel_failure_total(&self, kind: ChannelKind) -> u64 {
        self.channel_failure.get(kind)
    }

    pub fn eval_latency_vals(&self) -> (u64, u64) {
        (
            self.eval_latency_sum_us.load(Ordering::Relaxed),
            self.eval_latency_count.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vulnwatch_engine::dispatch::{ChannelResult, DispatchResult};

    #[test]
    fn outcomes_fold_into_counters() {
        let m = ServiceMetrics::new();
        let outcomes = vec![
            RuleOutcome::Dispatched {
                rule_id: "r-1".into(),
                result: DispatchResult {
                    dispatch_id: "d-1".into(),
                    rule_id: "r-1".into(),
                    vulnerability_id: "v-1".into(),
                    channel_results: vec![
                        ChannelResult::ok(ChannelKind::Slack, "slack", 0, 10),
                        ChannelResult::failed(ChannelKind::Webhook, "webhook", 1, 20, "HTTP 500"),
                    ],
                    completed_at_ms: 1000,
                },
            },
            RuleOutcome::Throttled {
                rule_id: "r-2".into(),
            },
            RuleOutcome::Failed {
                rule_id: "r-3".into(),
                stage: "dispatch",
                error: "audit: down".into(),
            },
        ];

        m.record_outcomes(&outcomes);

        assert_eq!(m.evaluation_rounds_total(), 1);
        assert_eq!(m.rules_matched_total(), 3);
        assert_eq!(m.dispatch_rounds_total(), 1);
        assert_eq!(m.cooldown_skips_total(), 1);
        assert_eq!(m.round_failures_total(), 1);
        assert_eq!(m.channel_success_total(ChannelKind::Slack), 1);
        assert_eq!(m.channel_failure_total(ChannelKind::Webhook), 1);
        assert_eq!(m.channel_success_total(ChannelKind::Email), 0);
    }

    #[test]
    fn latency_recording() {
        let m = ServiceMetrics::new();
        let start = Instant::now();
        std::thread::sleep(std::time::Duration::from_millis(1));
        m.record_eval_latency(start);
        let (sum, count) = m.eval_latency_vals();
        assert!(sum > 0);
        assert_eq!(count, 1);
    }
}
