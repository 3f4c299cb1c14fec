//! `tracing_subscriber` initialisation, used instead of `env_logger` so the
//! whole workspace logs through one subscriber rather than mixing `log` and
//! `tracing`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Reads `LOG_LEVEL` (falling back to `info`) and installs a global subscriber
/// that writes to stdout with target + level. Call once, at process start.
pub fn init() {
	let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer()).init();
}
