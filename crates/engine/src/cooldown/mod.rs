mod memory;
mod postgres;

pub use memory::MemoryCooldownStore;
pub use postgres::PgCooldownStore;

use serde::{Deserialize, Serialize};

/// Per-rule throttle state. Created lazily on first acquisition, never
/// deleted while the owning rule exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownState {
    pub rule_id: String,
    pub last_triggered_at_ms: Option<i64>,
    pub in_flight: bool,
}

/// Result of a compare-and-set acquisition attempt. The falsy variants are
/// distinguishable so skips are attributable in engine outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    Acquired,
    Throttled,
    InFlight,
}

impl Acquisition {
    pub fn acquired(&self) -> bool {
        matches!(self, Self::Acquired)
    }
}

#[derive(Debug)]
pub struct CooldownError(pub String);

impl std::fmt::Display for CooldownError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cooldown: {}", self.0)
    }
}

impl std::error::Error for CooldownError {}

/// The only mutable shared state with concurrent writers in the pipeline.
/// `try_acquire` must be atomic per rule: under N concurrent callers exactly
/// one may win. Callers treat a store error as fail-closed (no dispatch).
#[async_trait::async_trait]
pub trait CooldownStore: Send + Sync {
    /// Succeeds only if the rule is not in flight and the cooldown window has
    /// elapsed (or was never started); on success the in-flight guard is set
    /// in the same atomic step.
    async fn try_acquire(
        &self,
        rule_id: &str,
        cooldown_minutes: i64,
        now_ms: i64,
    ) -> Result<Acquisition, CooldownError>;

    /// Clears the in-flight guard without touching the trigger timestamp.
    /// Failure paths only: a released round does not count against the window.
    async fn release(&self, rule_id: &str) -> Result<(), CooldownError>;

    /// Stamps the trigger time and clears the guard after a completed round.
    async fn mark_triggered(&self, rule_id: &str, now_ms: i64) -> Result<(), CooldownError>;

    async fn state(&self, rule_id: &str) -> Result<Option<CooldownState>, CooldownError>;

    /// Cleanup when the owning rule is deleted.
    async fn remove(&self, rule_id: &str) -> Result<(), CooldownError>;
}

pub(crate) fn window_elapsed(
    last_triggered_at_ms: Option<i64>,
    cooldown_minutes: i64,
    now_ms: i64,
) -> bool {
    match last_triggered_at_ms {
        None => true,
        Some(last) => now_ms - last >= cooldown_minutes * 60_000,
    }
}
