use async_nats::jetstream;

use vulnwatch_common::broker::{AUDIT_SUBJECT, VULN_SUBJECT};
use vulnwatch_common::vuln::Vulnerability;
use vulnwatch_engine::dispatch::DispatchResult;

use super::publisher::{BrokerError, EventPublisher};

pub struct NatsPublisher {
    js: jetstream::Context,
}

impl NatsPublisher {
    pub fn new(js: jetstream::Context) -> Self {
        Self { js }
    }
}

#[async_trait::async_trait]
impl EventPublisher for NatsPublisher {
    async fn publish_vulnerability(&self, vuln: &Vulnerability) -> Result<(), BrokerError> {
        let payload = serde_json::to_vec(vuln).map_err(|e| BrokerError(e.to_string()))?;

        let mut headers = async_nats::HeaderMap::new();
        headers.insert("X-Vuln-Id", vuln.id.as_str());
        headers.insert("X-Cve-Id", vuln.cve_id.as_str());
        headers.insert("X-Observed-At", vuln.observed_at_ms.to_string().as_str());

        self.js
            .publish_with_headers(VULN_SUBJECT, headers, payload.into())
            .await
            .map_err(|e| BrokerError(e.to_string()))?
            .await
            .map_err(|e| BrokerError(e.to_string()))?;

        Ok(())
    }

    async fn publish_dispatch(&self, result: &DispatchResult) -> Result<(), BrokerError> {
        let payload = serde_json::to_vec(result).map_err(|e| BrokerError(e.to_string()))?;

        let mut headers = async_nats::HeaderMap::new();
        headers.insert("X-Dispatch-Id", result.dispatch_id.as_str());
        headers.insert("X-Rule-Id", result.rule_id.as_str());

        self.js
            .publish_with_headers(AUDIT_SUBJECT, headers, payload.into())
            .await
            .map_err(|e| BrokerError(e.to_string()))?
            .await
            .map_err(|e| BrokerError(e.to_string()))?;

        Ok(())
    }
}
