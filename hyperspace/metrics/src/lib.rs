//! Prometheus counters/gauges for the relay loop, served over HTTP.

pub mod error;
pub mod handler;

pub use error::MetricsError;
pub use handler::MetricsHandler;
