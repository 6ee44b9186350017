use async_nats::jetstream::consumer::PullConsumer;
use async_nats::jetstream::{AckKind, Message};

use vulnwatch_common::vuln::Vulnerability;

use super::handler::{decode_vulnerability, fetch_messages};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const IDLE_BACKOFF: std::time::Duration = std::time::Duration::from_millis(100);

/// Pull-consume loop over the vulnerability subject. Poison messages (decode
/// failures) are acked and dropped; processing failures are nacked for
/// redelivery up to the consumer's max_deliver.
pub struct ConsumerLoop {
    consumer: PullConsumer,
    batch_size: usize,
}

enum Disposition {
    Ack,
    Redeliver,
}

impl ConsumerLoop {
    pub fn new(consumer: PullConsumer, batch_size: usize) -> Self {
        Self {
            consumer,
            batch_size,
        }
    }

    pub async fn run<F, Fut>(&self, on_vulnerability: F) -> Result<(), BoxError>
    where
        F: Fn(Vulnerability) -> Fut,
        Fut: std::future::Future<Output = Result<(), BoxError>>,
    {
        loop {
            let fetched = fetch_messages(&self.consumer, self.batch_size).await?;
            if fetched.is_empty() {
                tokio::time::sleep(IDLE_BACKOFF).await;
                continue;
            }
            for msg in fetched {
                let disposition = Self::process(&msg, &on_vulnerability).await;
                Self::settle(&msg, disposition).await;
            }
        }
    }

    async fn process<F, Fut>(msg: &Message, on_vulnerability: &F) -> Disposition
    where
        F: Fn(Vulnerability) -> Fut,
        Fut: std::future::Future<Output = Result<(), BoxError>>,
    {
        let vuln = match decode_vulnerability(msg) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "malformed payload, discarding");
                return Disposition::Ack;
            }
        };
        match on_vulnerability(vuln).await {
            Ok(()) => Disposition::Ack,
            Err(e) => {
                tracing::error!(error = %e, "vulnerability handling failed, scheduling redelivery");
                Disposition::Redeliver
            }
        }
    }

    async fn settle(msg: &Message, disposition: Disposition) {
        let outcome = match disposition {
            Disposition::Ack => msg.ack().await,
            Disposition::Redeliver => msg.ack_with(AckKind::Nak(None)).await,
        };
        if let Err(e) = outcome {
            tracing::warn!(error = %e, "message settlement failed");
        }
    }
}
