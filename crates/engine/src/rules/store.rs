use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

use super::rule::AlertRule;

/// Indexed in-memory rule store. The engine only ever asks indexed questions
/// (active rules, rules per owner); there is no flat-scan contract. Cross-index
/// updates are not transactional: rule mutation is administrative and the read
/// paths tolerate momentary staleness.
#[derive(Clone)]
pub struct RuleStore {
    rules: Arc<DashMap<String, AlertRule>>,
    by_owner: Arc<DashMap<String, HashSet<String>>>,
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleStore {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(DashMap::new()),
            by_owner: Arc::new(DashMap::new()),
        }
    }

    pub fn insert(&self, rule: AlertRule) {
        self.by_owner
            .entry(rule.owner_id.clone())
            .or_default()
            .insert(rule.id.clone());
        self.rules.insert(rule.id.clone(), rule);
    }

    pub fn get(&self, id: &str) -> Option<AlertRule> {
        self.rules.get(id).map(|r| r.clone())
    }

    pub fn list(&self) -> Vec<AlertRule> {
        self.rules.iter().map(|r| r.value().clone()).collect()
    }

    pub fn list_by_owner(&self, owner_id: &str) -> Vec<AlertRule> {
        let Some(ids) = self.by_owner.get(owner_id) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| self.rules.get(id).map(|r| r.clone()))
            .collect()
    }

    pub fn list_active(&self, owner_id: Option<&str>) -> Vec<AlertRule> {
        match owner_id {
            Some(owner) => self
                .list_by_owner(owner)
                .into_iter()
                .filter(|r| r.is_active)
                .collect(),
            None => self
                .rules
                .iter()
                .filter(|r| r.value().is_active)
                .map(|r| r.value().clone())
                .collect(),
        }
    }

    pub fn update(&self, rule: AlertRule) -> bool {
        let Some(previous) = self.rules.get(&rule.id).map(|r| r.clone()) else {
            return false;
        };
        if previous.owner_id != rule.owner_id {
            if let Some(mut ids) = self.by_owner.get_mut(&previous.owner_id) {
                ids.remove(&rule.id);
            }
            self.by_owner
                .entry(rule.owner_id.clone())
                .or_default()
                .insert(rule.id.clone());
        }
        self.rules.insert(rule.id.clone(), rule);
        true
    }

    pub fn delete(&self, id: &str) -> bool {
        let Some((_, rule)) = self.rules.remove(id) else {
            return false;
        };
        if let Some(mut ids) = self.by_owner.get_mut(&rule.owner_id) {
            ids.remove(id);
        }
        true
    }

    /// Bumps the trigger counter by exactly one. Called once per completed
    /// dispatch round; definition timestamps are untouched so a firing rule
    /// does not look edited.
    pub fn record_trigger(&self, id: &str) -> Option<u64> {
        self.rules.get_mut(id).map(|mut r| {
            r.trigger_count += 1;
            r.trigger_count
        })
    }

    pub fn count(&self) -> usize {
        self.rules.len()
    }
}
