//! Process-wide configuration: a `config.toml` plus the environment variables of
//! spec §6, generalising the teacher's per-chain `CosmosClientConfig` into a
//! multi-chain, multi-path `Config`.

use primitives::relay_path::IbcVersion;
use serde::Deserialize;
use std::time::Duration;

#[cfg(feature = "cosmos")]
use cosmos::CosmosClientConfig;
#[cfg(feature = "gno")]
use gno::GnoClientConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChainConfig {
	#[cfg(feature = "cosmos")]
	Cosmos(CosmosClientConfig),
	#[cfg(feature = "gno")]
	Gno(GnoClientConfig),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathConfig {
	pub chain_a: String,
	pub chain_b: String,
	pub client_a: String,
	pub client_b: String,
	#[serde(default = "default_version")]
	pub version: IbcVersionConfig,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IbcVersionConfig {
	V1,
	V2,
}

impl From<IbcVersionConfig> for IbcVersion {
	fn from(v: IbcVersionConfig) -> Self {
		match v {
			IbcVersionConfig::V1 => IbcVersion::V1,
			IbcVersionConfig::V2 => IbcVersion::V2,
		}
	}
}

fn default_version() -> IbcVersionConfig {
	IbcVersionConfig::V2
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	#[serde(default = "default_db_file")]
	pub db_file: String,
	#[serde(default)]
	pub chains: std::collections::HashMap<String, ChainConfig>,
	#[serde(default)]
	pub paths: Vec<PathConfig>,
	#[serde(default)]
	pub network: NetworkConfig,
	#[serde(default)]
	pub relay: RelayTuning,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
	#[serde(default = "default_max_retries")]
	pub max_retries: u32,
	#[serde(default = "default_retry_backoff_ms")]
	pub retry_backoff_ms: u64,
	#[serde(default = "default_request_timeout_secs")]
	pub request_timeout_secs: u64,
}

impl Default for NetworkConfig {
	fn default() -> Self {
		Self {
			max_retries: default_max_retries(),
			retry_backoff_ms: default_retry_backoff_ms(),
			request_timeout_secs: default_request_timeout_secs(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayTuning {
	#[serde(default = "default_poll_interval_secs")]
	pub poll_interval_secs: u64,
	#[serde(default = "default_max_age_secs")]
	pub max_age_dest_secs: u64,
	#[serde(default = "default_max_age_secs")]
	pub max_age_src_secs: u64,
	#[serde(default = "default_timeout_blocks_slack")]
	pub timeout_blocks_slack: u64,
	#[serde(default = "default_timeout_seconds_slack")]
	pub timeout_seconds_slack: u64,
	#[serde(default = "default_block_time_secs")]
	pub estimated_block_time_secs: u64,
	#[serde(default = "default_indexer_time_ms")]
	pub estimated_indexer_time_ms: u64,
}

impl Default for RelayTuning {
	fn default() -> Self {
		Self {
			poll_interval_secs: default_poll_interval_secs(),
			max_age_dest_secs: default_max_age_secs(),
			max_age_src_secs: default_max_age_secs(),
			timeout_blocks_slack: default_timeout_blocks_slack(),
			timeout_seconds_slack: default_timeout_seconds_slack(),
			estimated_block_time_secs: default_block_time_secs(),
			estimated_indexer_time_ms: default_indexer_time_ms(),
		}
	}
}

impl RelayTuning {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_secs(self.poll_interval_secs)
	}

	pub fn max_age_dest(&self) -> Duration {
		Duration::from_secs(self.max_age_dest_secs)
	}

	pub fn max_age_src(&self) -> Duration {
		Duration::from_secs(self.max_age_src_secs)
	}
}

fn default_db_file() -> String {
	"hyperspace.db".into()
}
fn default_max_retries() -> u32 {
	3
}
fn default_retry_backoff_ms() -> u64 {
	500
}
fn default_request_timeout_secs() -> u64 {
	10
}
fn default_poll_interval_secs() -> u64 {
	10
}
fn default_max_age_secs() -> u64 {
	300
}
fn default_timeout_blocks_slack() -> u64 {
	2
}
fn default_timeout_seconds_slack() -> u64 {
	5
}
fn default_block_time_secs() -> u64 {
	6
}
fn default_indexer_time_ms() -> u64 {
	500
}

/// Parses `env_var` as `u64`, clamping to `[min, max]` and warning if it was out
/// of range, warning and returning `None` (keep the existing value) if it was
/// set but unparseable, and returning `None` silently if it was unset.
fn env_u64_clamped(env_var: &str, min: u64, max: u64) -> Option<u64> {
	let raw = std::env::var(env_var).ok()?;
	match raw.parse::<u64>() {
		Ok(v) if v < min || v > max => {
			let clamped = v.clamp(min, max);
			tracing::warn!(
				target: "hyperspace::config",
				env_var, value = v, min, max, clamped,
				"environment override out of range, clamping"
			);
			Some(clamped)
		},
		Ok(v) => Some(v),
		Err(_) => {
			tracing::warn!(target: "hyperspace::config", env_var, raw, "unparseable environment override, keeping existing value");
			None
		},
	}
}

fn env_u32_clamped(env_var: &str, min: u32, max: u32) -> Option<u32> {
	env_u64_clamped(env_var, min as u64, max as u64).map(|v| v as u32)
}

impl Config {
	pub fn from_toml_str(input: &str) -> Result<Self, primitives::error::Error> {
		toml::from_str(input).map_err(|e| primitives::error::Error::Configuration(e.to_string()))
	}

	/// Applies the spec §6 environment overrides on top of a parsed `config.toml`.
	/// Out-of-range values clamp to their interval and emit a warning;
	/// unparseable values fall back to whatever `config.toml` (or its defaults)
	/// already set. Several variables are documented in milliseconds while the
	/// fields they feed are stored in seconds; those are converted here.
	pub fn apply_env_overrides(&mut self) {
		if let Ok(db_file) = std::env::var("DB_FILE") {
			self.db_file = db_file;
		}
		if let Some(ms) = env_u64_clamped("RELAY_POLL_INTERVAL", 1_000, 60_000) {
			self.relay.poll_interval_secs = (ms / 1_000).max(1);
		}
		if let Some(ms) = env_u64_clamped("RELAY_MAX_AGE_DEST", 1_000, 24 * 3_600 * 1_000) {
			self.relay.max_age_dest_secs = (ms / 1_000).max(1);
		}
		if let Some(ms) = env_u64_clamped("RELAY_MAX_AGE_SRC", 1_000, 24 * 3_600 * 1_000) {
			self.relay.max_age_src_secs = (ms / 1_000).max(1);
		}
		if let Some(v) = env_u64_clamped("RELAY_TIMEOUT_BLOCKS", 0, 1_000) {
			self.relay.timeout_blocks_slack = v;
		}
		if let Some(v) = env_u64_clamped("RELAY_TIMEOUT_SECONDS", 0, 3_600) {
			self.relay.timeout_seconds_slack = v;
		}
		if let Some(v) = env_u32_clamped("NETWORK_MAX_RETRIES", 0, 10) {
			self.network.max_retries = v;
		}
		if let Some(v) = env_u64_clamped("NETWORK_RETRY_BACKOFF", 0, 60_000) {
			self.network.retry_backoff_ms = v;
		}
		if let Some(v) = env_u64_clamped("NETWORK_REQUEST_TIMEOUT", 1, 300) {
			self.network.request_timeout_secs = v;
		}
		if let Some(v) = env_u64_clamped("ESTIMATED_BLOCK_TIME", 1, 60) {
			self.relay.estimated_block_time_secs = v;
		}
		if let Some(v) = env_u64_clamped("ESTIMATED_INDEXER_TIME", 0, 60_000) {
			self.relay.estimated_indexer_time_ms = v;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Mutex;

	/// `apply_env_overrides` reads process-wide env vars; under the default
	/// parallel test runner two tests touching the same var can interleave
	/// `set_var`/`remove_var` and read each other's value. Serialise them.
	static ENV_LOCK: Mutex<()> = Mutex::new(());

	#[test]
	fn poll_interval_override_converts_ms_to_secs() {
		let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
		std::env::set_var("RELAY_POLL_INTERVAL", "5000");
		let mut config = Config::from_toml_str("").unwrap();
		config.apply_env_overrides();
		assert_eq!(config.relay.poll_interval_secs, 5);
		std::env::remove_var("RELAY_POLL_INTERVAL");
	}

	#[test]
	fn out_of_range_override_clamps_instead_of_rejecting() {
		let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
		std::env::set_var("RELAY_POLL_INTERVAL", "120000");
		let mut config = Config::from_toml_str("").unwrap();
		config.apply_env_overrides();
		assert_eq!(config.relay.poll_interval_secs, 60);
		std::env::remove_var("RELAY_POLL_INTERVAL");
	}

	#[test]
	fn unparseable_override_keeps_existing_value() {
		let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
		std::env::set_var("NETWORK_MAX_RETRIES", "not-a-number");
		let mut config = Config::from_toml_str("").unwrap();
		let before = config.network.max_retries;
		config.apply_env_overrides();
		assert_eq!(config.network.max_retries, before);
		std::env::remove_var("NETWORK_MAX_RETRIES");
	}
}
