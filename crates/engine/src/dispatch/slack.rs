use std::time::{Duration, Instant};

use reqwest::Client;
use vulnwatch_common::vuln::Severity;

use crate::rules::{ChannelAction, ChannelKind};

use super::channel::ChannelDispatcher;
use super::result::{ChannelResult, DispatchIntent};

pub(super) fn severity_color_hex(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "#36a64f",
        Severity::Medium => "#f2c744",
        Severity::High => "#e8710a",
        Severity::Critical => "#d32f2f",
    }
}

/// Slack-style incoming webhook: one POST with a short timeout, no retry.
/// Chat notifications are best-effort; a non-2xx is a hard failure.
pub struct SlackDispatcher {
    client: Client,
}

impl SlackDispatcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ChannelDispatcher for SlackDispatcher {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Slack
    }

    async fn send(&self, intent: &DispatchIntent, action: &ChannelAction) -> ChannelResult {
        let start = Instant::now();
        let ChannelAction::Slack(cfg) = action else {
            return ChannelResult::failed(
                ChannelKind::Slack,
                "slack",
                0,
                0,
                "mismatched channel config",
            );
        };

        let vuln = &intent.vulnerability;
        let mut payload = serde_json::json!({
            "attachments": [{
                "color": severity_color_hex(vuln.severity),
                "title": format!(
                    ":rotating_light: [{}] {} - {}",
                    vuln.severity.label(),
                    vuln.cve_id,
                    vuln.title
                ),
                "fields": [
                    { "title": "Rule", "value": &intent.rule_name, "short": true },
                    { "title": "CVSS", "value": vuln.cvss_score.map_or("n/a".into(), |s| format!("{s:.1}")), "short": true },
                    { "title": "Exploit", "value": vuln.exploit_available.to_string(), "short": true },
                    { "title": "Patch", "value": vuln.patch_available.to_string(), "short": true },
                    { "title": "Affected", "value": vuln.affected_software.join(", "), "short": false },
                ],
            }]
        });
        if let Some(channel) = &cfg.channel {
            payload["channel"] = serde_json::json!(channel);
        }

        let outcome = async {
            self.client
                .post(&cfg.webhook_url)
                .json(&payload)
                .send()
                .await?
                .error_for_status()?;
            Ok::<_, reqwest::Error>(())
        }
        .await;

        let latency_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(()) => ChannelResult::ok(ChannelKind::Slack, "slack", 0, latency_ms),
            Err(e) => ChannelResult::failed(ChannelKind::Slack, "slack", 0, latency_ms, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_build_is_checked() {
        assert!(SlackDispatcher::new(Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn colors_follow_severity_ladder() {
        assert_eq!(severity_color_hex(Severity::Low), "#36a64f");
        assert_eq!(severity_color_hex(Severity::Critical), "#d32f2f");
        assert_ne!(
            severity_color_hex(Severity::High),
            severity_color_hex(Severity::Medium)
        );
    }
}
