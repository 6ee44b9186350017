use async_nats::jetstream;
use async_nats::jetstream::consumer::PullConsumer;

use vulnwatch_common::broker::{CONSUMER_NAME, STREAM_NAME, VULN_SUBJECT};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Durable pull consumer over the vulnerability subject only; the audit
/// subject on the same stream has no in-process consumer.
pub async fn create_pull_consumer(js: &jetstream::Context) -> Result<PullConsumer, BoxError> {
    let stream = js.get_stream(STREAM_NAME).await?;

    let consumer_config = jetstream::consumer::pull::Config {
        durable_name: Some(CONSUMER_NAME.into()),
        filter_subject: VULN_SUBJECT.into(),
        ack_policy: jetstream::consumer::AckPolicy::Explicit,
        max_deliver: 5,
        ..Default::default()
    };

    Ok(stream
        .get_or_create_consumer(CONSUMER_NAME, consumer_config)
        .await?)
}
