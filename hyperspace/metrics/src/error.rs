use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
	#[error("prometheus registration error: {0}")]
	Prometheus(#[from] prometheus::Error),
	#[error("metrics server error: {0}")]
	Serve(hyper::Error),
}
