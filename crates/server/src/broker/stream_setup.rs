use std::time::Duration;

use async_nats::jetstream;
use async_nats::jetstream::stream::Stream;

use vulnwatch_common::broker::StreamConfig;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Connect to the broker and enter the JetStream context.
pub async fn connect_jetstream(url: &str) -> Result<jetstream::Context, BoxError> {
    Ok(jetstream::new(async_nats::connect(url).await?))
}

/// Idempotently create (or look up) the event stream described by `config`.
pub async fn ensure_stream(
    js: &jetstream::Context,
    config: &StreamConfig,
) -> Result<Stream, BoxError> {
    Ok(js.get_or_create_stream(jetstream_config(config)).await?)
}

fn jetstream_config(config: &StreamConfig) -> jetstream::stream::Config {
    jetstream::stream::Config {
        name: config.name.clone(),
        subjects: config.subjects.clone(),
        max_bytes: config.max_bytes,
        max_age: Duration::from_secs(config.max_age_secs),
        num_replicas: config.num_replicas,
        ..Default::default()
    }
}
