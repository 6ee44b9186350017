use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use vulnwatch_common::vuln::Vulnerability;
use vulnwatch_engine::dispatch::DispatchResult;

use super::publisher::{BrokerError, EventPublisher};

/// Records published events without a broker. Used in tests and when the
/// service runs without NATS configured.
#[derive(Clone, Default)]
pub struct InMemoryPublisher {
    vulns: Arc<Mutex<Vec<Vulnerability>>>,
    dispatches: Arc<Mutex<Vec<DispatchResult>>>,
    count: Arc<AtomicUsize>,
}

impl InMemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published_count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub async fn published_vulnerabilities(&self) -> Vec<Vulnerability> {
        self.vulns.lock().await.clone()
    }

    pub async fn published_dispatches(&self) -> Vec<DispatchResult> {
        self.dispatches.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl EventPublisher for InMemoryPublisher {
    async fn publish_vulnerability(&self, vuln: &Vulnerability) -> Result<(), BrokerError> {
        self.vulns.lock().await.push(vuln.clone());
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn publish_dispatch(&self, result: &DispatchResult) -> Result<(), BrokerError> {
        self.dispatches.lock().await.push(result.clone());
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
