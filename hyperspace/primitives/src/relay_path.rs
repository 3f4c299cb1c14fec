use crate::chain_id::ChainId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainType {
	Cosmos,
	Gno,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IbcVersion {
	V1,
	V2,
}

/// A persisted relay path: which two chains, which chain families, and which
/// on-chain client/connection identifiers anchor it. Keyed by autoincrement id in
/// the Store.
#[derive(Debug, Clone)]
pub struct RelayPath {
	pub id: Option<i64>,
	pub chain_id_a: ChainId,
	pub node_a: String,
	pub query_node_a: Option<String>,
	pub chain_id_b: ChainId,
	pub node_b: String,
	pub query_node_b: Option<String>,
	pub chain_type_a: ChainType,
	pub chain_type_b: ChainType,
	/// v1: connection id. v2: client id.
	pub client_a: String,
	pub client_b: String,
	pub version: IbcVersion,
	/// v1 only: the channel namespace relay rounds run over. `None` until the
	/// handshake in `add-path` completes; a v1 path with no channel cannot run
	/// relay rounds yet. Not part of spec §3's literal field list, which only
	/// names a connection id — a connection alone is not enough to resume
	/// packet relay across a restart, so this supplements it.
	pub port_id: Option<String>,
	pub channel_a: Option<String>,
	pub channel_b: Option<String>,
	pub ordered: bool,
}
