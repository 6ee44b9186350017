use async_nats::jetstream::consumer::PullConsumer;
use async_nats::jetstream::Message;
use futures::StreamExt;

use vulnwatch_common::vuln::Vulnerability;
use vulnwatch_engine::RuleOutcome;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Redeliver only rounds where every matched rule failed before its cooldown
/// was acquired: nothing was dispatched, so a retry cannot duplicate alerts.
/// Any round that made progress is acked as-is; redelivering it would re-fire
/// rules whose cooldown window has already lapsed.
pub fn worth_redelivering(outcomes: &[RuleOutcome]) -> bool {
    !outcomes.is_empty()
        && outcomes
            .iter()
            .all(|o| matches!(o, RuleOutcome::Failed { stage, .. } if *stage == "cooldown"))
}

/// Parse a broker message payload into a vulnerability event.
pub fn decode_vulnerability(msg: &Message) -> Result<Vulnerability, serde_json::Error> {
    serde_json::from_slice(&msg.payload)
}

/// Fetch up to `max_messages` from the pull consumer in one round trip.
pub async fn fetch_messages(
    consumer: &PullConsumer,
    max_messages: usize,
) -> Result<Vec<Message>, BoxError> {
    let mut stream = consumer
        .fetch()
        .max_messages(max_messages)
        .messages()
        .await?;
    let mut fetched = Vec::with_capacity(max_messages);
    while let Some(next) = stream.next().await {
        fetched.push(next?);
    }
    Ok(fetched)
}
