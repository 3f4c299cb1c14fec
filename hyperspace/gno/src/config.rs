use serde::Deserialize;

/// Gno is v2-only (client-scoped packets, no port/channel handshake), so its config
/// carries no connection/port/channel fields — modelled as a second tagged variant
/// rather than a generalised v1-capable chain.
#[derive(Debug, Clone, Deserialize)]
pub struct GnoClientConfig {
	pub name: String,
	pub rpc_url: String,
	pub chain_id: String,
	pub client_id: Option<String>,
	pub account_prefix: String,
	pub key_name: String,
	pub gas_price: f64,
	pub gas_denom: String,
}
