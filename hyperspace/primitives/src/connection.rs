/// v1-only connection/channel handshake state. Only `Open` is relayable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
	Init,
	TryOpen,
	Open,
	Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
	Init,
	TryOpen,
	Open,
	Closed,
}

impl ConnectionState {
	pub fn is_relayable(&self) -> bool {
		matches!(self, ConnectionState::Open)
	}
}

impl ChannelState {
	pub fn is_relayable(&self) -> bool {
		matches!(self, ChannelState::Open)
	}
}

#[derive(Debug, Clone)]
pub struct Connection {
	pub state: ConnectionState,
	pub client_id: String,
	pub counterparty_client_id: String,
	pub counterparty_connection_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Channel {
	pub state: ChannelState,
	pub ordering_ordered: bool,
	pub counterparty_port_id: String,
	pub counterparty_channel_id: Option<String>,
	pub version: String,
}

/// v2-only: a bidirectional binding recorded on each chain pointing at the other,
/// replacing the v1 connection/channel handshake.
#[derive(Debug, Clone)]
pub struct CounterpartyRegistration {
	pub client_id_local: String,
	pub client_id_remote: String,
	pub merkle_prefix: Vec<u8>,
}
