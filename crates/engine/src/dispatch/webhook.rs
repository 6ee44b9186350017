use std::time::{Duration, Instant};

use chrono::DateTime;
use reqwest::{Client, Method};
use serde::Serialize;

use vulnwatch_common::crypto::sign_data;
use vulnwatch_common::vuln::Vulnerability;

use crate::rules::{ChannelAction, ChannelKind, WebhookConfig};

use super::channel::ChannelDispatcher;
use super::result::{ChannelResult, DispatchIntent};

/// Canonical generic-webhook envelope. This is a stable wire format consumed
/// by user integrations; field names and shape must not change.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookEnvelope<'a> {
    dispatch_id: &'a str,
    timestamp: String,
    rule_id: &'a str,
    vulnerability: VulnSummary<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VulnSummary<'a> {
    cve_id: &'a str,
    title: &'a str,
    severity: &'a str,
    cvss_score: Option<f64>,
    affected_software: &'a [String],
    exploit_available: bool,
    patch_available: bool,
}

fn envelope_body(intent: &DispatchIntent) -> Result<Vec<u8>, serde_json::Error> {
    let vuln: &Vulnerability = &intent.vulnerability;
    let timestamp = DateTime::from_timestamp_millis(intent.generated_at_ms)
        .unwrap_or_default()
        .to_rfc3339();
    serde_json::to_vec(&WebhookEnvelope {
        dispatch_id: &intent.dispatch_id,
        timestamp,
        rule_id: &intent.rule_id,
        vulnerability: VulnSummary {
            cve_id: &vuln.cve_id,
            title: &vuln.title,
            severity: vuln.severity.as_str(),
            cvss_score: vuln.cvss_score,
            affected_software: &vuln.affected_software,
            exploit_available: vuln.exploit_available,
            patch_available: vuln.patch_available,
        },
    })
}

fn resolve_method(cfg: &WebhookConfig) -> Result<Method, String> {
    match &cfg.method {
        None => Ok(Method::POST),
        Some(m) => Method::from_bytes(m.to_ascii_uppercase().as_bytes())
            .map_err(|_| format!("invalid HTTP method '{m}'")),
    }
}

/// Generic webhook channel: POSTs (or user-chosen method) the canonical JSON
/// envelope to a user-configured URL with user headers merged in. When the
/// action carries a secret the body is HMAC-signed.
pub struct WebhookDispatcher {
    client: Client,
}

impl WebhookDispatcher {
    /// Fails only when the HTTP client itself cannot be built; the timeout
    /// must end up on the client rather than being silently dropped.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ChannelDispatcher for WebhookDispatcher {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Webhook
    }

    async fn send(&self, intent: &DispatchIntent, action: &ChannelAction) -> ChannelResult {
        let start = Instant::now();
        let ChannelAction::Webhook(cfg) = action else {
            return ChannelResult::failed(
                ChannelKind::Webhook,
                "webhook",
                0,
                0,
                "mismatched channel config",
            );
        };

        let body = match envelope_body(intent) {
            Ok(body) => body,
            Err(e) => {
                return ChannelResult::failed(ChannelKind::Webhook, "webhook", 0, 0, e.to_string())
            }
        };
        let method = match resolve_method(cfg) {
            Ok(m) => m,
            Err(e) => return ChannelResult::failed(ChannelKind::Webhook, "webhook", 0, 0, e),
        };

        let mut request = self
            .client
            .request(method, &cfg.url)
            .header("Content-Type", "application/json")
            .header("X-Vulnwatch-Dispatch-Id", &intent.dispatch_id);

        for (name, value) in &cfg.headers {
            request = request.header(name, value);
        }

        if let Some(secret) = &cfg.secret {
            let signature = sign_data(secret.as_bytes(), &body);
            request = request.header("X-Vulnwatch-Signature", signature);
        }

        let outcome = async {
            request.body(body).send().await?.error_for_status()?;
            Ok::<_, reqwest::Error>(())
        }
        .await;

        let latency_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(()) => ChannelResult::ok(ChannelKind::Webhook, "webhook", 0, latency_ms),
            Err(e) => {
                ChannelResult::failed(ChannelKind::Webhook, "webhook", 0, latency_ms, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vulnwatch_common::vuln::Severity;

    #[test]
    fn client_build_is_checked() {
        assert!(WebhookDispatcher::new(Duration::from_secs(1)).is_ok());
    }

    fn sample_intent() -> DispatchIntent {
        DispatchIntent {
            dispatch_id: "d-42".into(),
            rule_id: "r-1".into(),
            rule_name: "crit".into(),
            owner_id: "u-1".into(),
            vulnerability: Vulnerability {
                id: "v-1".into(),
                cve_id: "CVE-2024-0001".into(),
                title: "Heap overflow".into(),
                severity: Severity::High,
                cvss_score: Some(8.1),
                affected_software: vec!["libexample".into()],
                category: None,
                exploit_available: true,
                patch_available: false,
                kev: false,
                trending: false,
                tags: vec![],
                cwe_id: None,
                observed_at_ms: 1_700_000_000_000,
            },
            matched_conditions: vec![],
            generated_at_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn envelope_shape_is_stable() {
        let body = envelope_body(&sample_intent()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["dispatchId"], "d-42");
        assert_eq!(json["ruleId"], "r-1");
        assert_eq!(json["vulnerability"]["cveId"], "CVE-2024-0001");
        assert_eq!(json["vulnerability"]["severity"], "high");
        assert_eq!(json["vulnerability"]["cvssScore"], 8.1);
        assert_eq!(json["vulnerability"]["exploitAvailable"], true);
        assert_eq!(json["vulnerability"]["patchAvailable"], false);
        assert_eq!(json["vulnerability"]["affectedSoftware"][0], "libexample");
        // ISO-8601 timestamp
        let ts = json["timestamp"].as_str().unwrap();
        assert!(ts.starts_with("2023-11-14T22:13:20"));
    }

    #[test]
    fn method_defaults_to_post() {
        let cfg = WebhookConfig {
            url: "https://example.com".into(),
            method: None,
            headers: Default::default(),
            secret: None,
        };
        assert_eq!(resolve_method(&cfg).unwrap(), Method::POST);
    }

    #[test]
    fn method_is_case_insensitive() {
        let cfg = WebhookConfig {
            url: "https://example.com".into(),
            method: Some("put".into()),
            headers: Default::default(),
            secret: None,
        };
        assert_eq!(resolve_method(&cfg).unwrap(), Method::PUT);
    }

    #[test]
    fn signature_verifies_against_body() {
        let body = envelope_body(&sample_intent()).unwrap();
        let sig = sign_data(b"hook-secret", &body);
        assert!(vulnwatch_common::crypto::verify_signature(
            b"hook-secret",
            &body,
            &sig
        ));
    }
}
