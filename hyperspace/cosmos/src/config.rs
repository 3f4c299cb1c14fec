use serde::Deserialize;

/// Config options for a [`crate::client::CosmosClient`]. Leaves out everything
/// a relayer config can default instead of configuring (gas multiplier,
/// max-msg-num, batching knobs, extension options, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct CosmosClientConfig {
	pub name: String,
	pub rpc_url: String,
	pub grpc_url: String,
	pub chain_id: String,
	pub client_id: Option<String>,
	pub connection_id: Option<String>,
	pub account_prefix: String,
	pub store_prefix: String,
	pub key_name: String,
	pub gas_price: f64,
	pub gas_denom: String,
	#[serde(default = "default_trusting_period_secs")]
	pub trusting_period_secs: u64,
	#[serde(default = "default_max_clock_drift_secs")]
	pub max_clock_drift_secs: u64,
}

fn default_trusting_period_secs() -> u64 {
	14 * 24 * 3600
}

fn default_max_clock_drift_secs() -> u64 {
	20
}
