use vulnwatch_common::vuln::Vulnerability;
use vulnwatch_engine::dispatch::DispatchResult;

#[async_trait::async_trait]
pub trait EventPublisher: Send + Sync {
    /// Observed vulnerability headed for the evaluation consumer.
    async fn publish_vulnerability(&self, vuln: &Vulnerability) -> Result<(), BrokerError>;

    /// Completed dispatch round for downstream analytics. Best-effort for
    /// callers: the audit sink write is the binding record.
    async fn publish_dispatch(&self, result: &DispatchResult) -> Result<(), BrokerError>;
}

#[derive(Debug)]
pub struct BrokerError(pub String);

impl std::fmt::Display for BrokerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "broker: {}", self.0)
    }
}

impl std::error::Error for BrokerError {}
