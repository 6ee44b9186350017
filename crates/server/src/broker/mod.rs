mod in_memory;
mod nats_publisher;
mod publisher;
mod stream_setup;
mod streaming_audit;

pub use in_memory::InMemoryPublisher;
pub use nats_publisher::NatsPublisher;
pub use publisher::{BrokerError, EventPublisher};
pub use stream_setup::{connect_jetstream, ensure_stream};
pub use streaming_audit::StreamingAuditSink;
