use std::sync::Arc;
use std::time::Instant;

use vulnwatch_common::dispatch_id;

use crate::inbox::{Notification, NotificationPrefs, NotificationStore};
use crate::rules::{ChannelAction, ChannelKind};

use super::channel::ChannelDispatcher;
use super::result::{ChannelResult, DispatchIntent};

/// In-app channel: writes a notification row for the rule owner. The only
/// failure mode is storage unavailability, surfaced like any other channel
/// failure. Owner preferences may suppress delivery, recorded as a skip.
pub struct InAppDispatcher {
    store: Arc<dyn NotificationStore>,
    prefs: Arc<dyn NotificationPrefs>,
}

impl InAppDispatcher {
    pub fn new(store: Arc<dyn NotificationStore>, prefs: Arc<dyn NotificationPrefs>) -> Self {
        Self { store, prefs }
    }
}

#[async_trait::async_trait]
impl ChannelDispatcher for InAppDispatcher {
    fn kind(&self) -> ChannelKind {
        ChannelKind::InApp
    }

    async fn send(&self, intent: &DispatchIntent, action: &ChannelAction) -> ChannelResult {
        let start = Instant::now();
        if !matches!(action, ChannelAction::InApp(_)) {
            return ChannelResult::failed(
                ChannelKind::InApp,
                "inbox",
                0,
                0,
                "mismatched channel config",
            );
        }

        if !self.prefs.in_app_enabled(&intent.owner_id).await {
            tracing::debug!(
                owner_id = %intent.owner_id,
                rule_id = %intent.rule_id,
                "in-app notifications suppressed by owner preferences"
            );
            return ChannelResult::skipped(ChannelKind::InApp);
        }

        let vuln = &intent.vulnerability;
        let notification = Notification {
            id: dispatch_id::mint(),
            owner_id: intent.owner_id.clone(),
            rule_id: intent.rule_id.clone(),
            vulnerability_id: vuln.id.clone(),
            title: format!("[{}] {}", vuln.severity.label(), vuln.cve_id),
            body: format!("{} matched rule '{}'", vuln.title, intent.rule_name),
            severity: vuln.severity.as_str().to_string(),
            read: false,
            created_at_ms: intent.generated_at_ms,
        };

        let latency = |start: Instant| start.elapsed().as_millis() as u64;
        match self.store.append(&notification).await {
            Ok(()) => ChannelResult::ok(ChannelKind::InApp, "inbox", 0, latency(start)),
            Err(e) => {
                ChannelResult::failed(ChannelKind::InApp, "inbox", 0, latency(start), e.to_string())
            }
        }
    }
}
