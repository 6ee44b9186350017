use std::time::{Duration, Instant};

use reqwest::Client;
use vulnwatch_common::vuln::Severity;

use crate::rules::{ChannelAction, ChannelKind};

use super::channel::ChannelDispatcher;
use super::result::{ChannelResult, DispatchIntent};

fn severity_color(severity: Severity) -> u32 {
    match severity {
        Severity::Low => 0x36a64f,
        Severity::Medium => 0xf2c744,
        Severity::High => 0xe8710a,
        Severity::Critical => 0xd32f2f,
    }
}

/// Discord-style webhook: embed payload, single POST, short timeout, no
/// retry. Non-2xx is a hard failure.
pub struct DiscordDispatcher {
    client: Client,
}

impl DiscordDispatcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ChannelDispatcher for DiscordDispatcher {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Discord
    }

    async fn send(&self, intent: &DispatchIntent, action: &ChannelAction) -> ChannelResult {
        let start = Instant::now();
        let ChannelAction::Discord(cfg) = action else {
            return ChannelResult::failed(
                ChannelKind::Discord,
                "discord",
                0,
                0,
                "mismatched channel config",
            );
        };

        let vuln = &intent.vulnerability;
        let payload = serde_json::json!({
            "embeds": [{
                "title": format!("[{}] {} - {}", vuln.severity.label(), vuln.cve_id, vuln.title),
                "color": severity_color(vuln.severity),
                "fields": [
                    { "name": "Rule", "value": &intent.rule_name, "inline": true },
                    { "name": "Severity", "value": vuln.severity.as_str(), "inline": true },
                    { "name": "CVSS", "value": vuln.cvss_score.map_or("n/a".into(), |s| format!("{s:.1}")), "inline": true },
                    { "name": "Exploit", "value": vuln.exploit_available.to_string(), "inline": true },
                    { "name": "Patch", "value": vuln.patch_available.to_string(), "inline": true },
                    { "name": "Affected", "value": vuln.affected_software.join(", "), "inline": false },
                ],
            }]
        });

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
            Ok(()) => ChannelResult::ok(ChannelKind::Discord, "discord", 0, latency_ms),
            Err(e) => {
                ChannelResult::failed(ChannelKind::Discord, "discord", 0, latency_ms, e.to_string())
            }
        }
    }
}
