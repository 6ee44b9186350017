use dashmap::DashMap;
use std::sync::Arc;

use super::{window_elapsed, Acquisition, CooldownError, CooldownState, CooldownStore};

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    last_triggered_at_ms: Option<i64>,
    in_flight: bool,
}

/// In-memory cooldown store. The DashMap entry API holds the shard lock for
/// the duration of the check-and-set, which gives the per-rule CAS the
/// atomicity the contract requires.
#[derive(Clone, Default)]
pub struct MemoryCooldownStore {
    slots: Arc<DashMap<String, Slot>>,
}

impl MemoryCooldownStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CooldownStore for MemoryCooldownStore {
    async fn try_acquire(
        &self,
        rule_id: &str,
        cooldown_minutes: i64,
        now_ms: i64,
    ) -> Result<Acquisition, CooldownError> {
        let mut slot = self.slots.entry(rule_id.to_string()).or_default();
        if slot.in_flight {
            return Ok(Acquisition::InFlight);
        }
        if !window_elapsed(slot.last_triggered_at_ms, cooldown_minutes, now_ms) {
            return Ok(Acquisition::Throttled);
        }
        slot.in_flight = true;
        Ok(Acquisition::Acquired)
    }

    async fn release(&self, rule_id: &str) -> Result<(), CooldownError> {
        if let Some(mut slot) = self.slots.get_mut(rule_id) {
            slot.in_flight = false;
        }
        Ok(())
    }

    async fn mark_triggered(&self, rule_id: &str, now_ms: i64) -> Result<(), CooldownError> {
        let mut slot = self.slots.entry(rule_id.to_string()).or_default();
        slot.last_triggered_at_ms = Some(now_ms);
        slot.in_flight = false;
        Ok(())
    }

    async fn state(&self, rule_id: &str) -> Result<Option<CooldownState>, CooldownError> {
        Ok(self.slots.get(rule_id).map(|slot| CooldownState {
            rule_id: rule_id.to_string(),
            last_triggered_at_ms: slot.last_triggered_at_ms,
            in_flight: slot.in_flight,
        }))
    }

    async fn remove(&self, rule_id: &str) -> Result<(), CooldownError> {
        self.slots.remove(rule_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_acquire_wins() {
        let store = MemoryCooldownStore::new();
        let a = store.try_acquire("r-1", 60, 1000).await.unwrap();
        assert_eq!(a, Acquisition::Acquired);
    }

    #[tokio::test]
    async fn second_acquire_sees_in_flight() {
        let store = MemoryCooldownStore::new();
        store.try_acquire("r-1", 60, 1000).await.unwrap();
        let a = store.try_acquire("r-1", 60, 1000).await.unwrap();
        assert_eq!(a, Acquisition::InFlight);
    }

    #[tokio::test]
    async fn throttled_inside_window() {
        let store = MemoryCooldownStore::new();
        store.try_acquire("r-1", 60, 1000).await.unwrap();
        store.mark_triggered("r-1", 1000).await.unwrap();

        let a = store
            .try_acquire("r-1", 60, 1000 + 30 * 60_000)
            .await
            .unwrap();
        assert_eq!(a, Acquisition::Throttled);
    }

    #[tokio::test]
    async fn reacquire_after_window_elapses() {
        let store = MemoryCooldownStore::new();
        store.try_acquire("r-1", 60, 1000).await.unwrap();
        store.mark_triggered("r-1", 1000).await.unwrap();

        let a = store
            .try_acquire("r-1", 60, 1000 + 61 * 60_000)
            .await
            .unwrap();
        assert_eq!(a, Acquisition::Acquired);
    }

    #[tokio::test]
    async fn release_clears_guard_without_stamping() {
        let store = MemoryCooldownStore::new();
        store.try_acquire("r-1", 60, 1000).await.unwrap();
        store.release("r-1").await.unwrap();

        let state = store.state("r-1").await.unwrap().unwrap();
        assert!(!state.in_flight);
        assert!(state.last_triggered_at_ms.is_none());

        // window never started, so a new round may begin immediately
        let a = store.try_acquire("r-1", 60, 1001).await.unwrap();
        assert_eq!(a, Acquisition::Acquired);
    }

    #[tokio::test]
    async fn zero_cooldown_never_throttles() {
        let store = MemoryCooldownStore::new();
        store.try_acquire("r-1", 0, 1000).await.unwrap();
        store.mark_triggered("r-1", 1000).await.unwrap();
        let a = store.try_acquire("r-1", 0, 1000).await.unwrap();
        assert_eq!(a, Acquisition::Acquired);
    }

    #[tokio::test]
    async fn rules_are_independent() {
        let store = MemoryCooldownStore::new();
        store.try_acquire("r-1", 60, 1000).await.unwrap();
        let a = store.try_acquire("r-2", 60, 1000).await.unwrap();
        assert_eq!(a, Acquisition::Acquired);
    }

    #[tokio::test]
    async fn concurrent_acquires_exactly_one_winner() {
        let store = Arc::new(MemoryCooldownStore::new());
        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.try_acquire("r-1", 60, 1000).await.unwrap()
            }));
        }
        let mut acquired = 0;
        for h in handles {
            if h.await.unwrap().acquired() {
                acquired += 1;
            }
        }
        assert_eq!(acquired, 1);
    }

    #[tokio::test]
    async fn remove_forgets_rule() {
        let store = MemoryCooldownStore::new();
        store.try_acquire("r-1", 60, 1000).await.unwrap();
        store.mark_triggered("r-1", 1000).await.unwrap();
        store.remove("r-1").await.unwrap();
        assert!(store.state("r-1").await.unwrap().is_none());
    }
}
