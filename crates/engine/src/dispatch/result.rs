use serde::{Deserialize, Serialize};
use vulnwatch_common::vuln::Vulnerability;

use crate::rules::{ChannelKind, ConditionClause};

/// One rule-match handed from the engine to the coordinator. Ephemeral: only
/// its identifiers and the matched clauses survive into the audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchIntent {
    pub dispatch_id: String,
    pub rule_id: String,
    pub rule_name: String,
    pub owner_id: String,
    pub vulnerability: Vulnerability,
    pub matched_conditions: Vec<ConditionClause>,
    pub generated_at_ms: i64,
}

/// Per-channel delivery outcome. Failure is a value, never an exception:
/// every configured channel produces exactly one of these per round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelResult {
    pub channel: ChannelKind,
    pub success: bool,
    pub provider: String,
    pub retry_count: u32,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ChannelResult {
    pub fn ok(channel: ChannelKind, provider: &str, retry_count: u32, latency_ms: u64) -> Self {
        Self {
            channel,
            success: true,
            provider: provider.to_string(),
            retry_count,
            latency_ms,
            error_message: None,
        }
    }

    pub fn failed(
        channel: ChannelKind,
        provider: &str,
        retry_count: u32,
        latency_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            success: false,
            provider: provider.to_string(),
            retry_count,
            latency_ms,
            error_message: Some(error.into()),
        }
    }

    /// A channel that was never attempted (no dispatcher wired, suppressed by
    /// preferences, no resolvable address). Recorded, never dropped.
    pub fn skipped(channel: ChannelKind) -> Self {
        Self {
            channel,
            success: false,
            provider: "none".into(),
            retry_count: 0,
            latency_ms: 0,
            error_message: Some("skipped".into()),
        }
    }
}

/// Append-only audit record for one completed dispatch round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResult {
    pub dispatch_id: String,
    pub rule_id: String,
    pub vulnerability_id: String,
    pub channel_results: Vec<ChannelResult>,
    pub completed_at_ms: i64,
}

impl DispatchResult {
    pub fn all_succeeded(&self) -> bool {
        self.channel_results.iter().all(|r| r.success)
    }

    pub fn failed_channels(&self) -> impl Iterator<Item = &ChannelResult> {
        self.channel_results.iter().filter(|r| !r.success)
    }
}
