pub mod exposition;
pub mod service_metrics;

pub use exposition::render_prometheus;
pub use service_metrics::ServiceMetrics;
