mod connection;
mod consumer_loop;
mod handler;

pub use connection::create_pull_consumer;
pub use consumer_loop::ConsumerLoop;
pub use handler::worth_redelivering;
