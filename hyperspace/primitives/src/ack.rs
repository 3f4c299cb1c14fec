use crate::height::Height;
use crate::packet::Packet;

#[derive(Debug, Clone)]
pub struct AckMetadata {
	pub height: Height,
	/// Uppercase hex, matching the wire convention for tx hashes.
	pub tx_hash: String,
	pub tx_events: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Ack {
	pub original_packet: Packet,
	pub acknowledgement: Vec<u8>,
	pub metadata: AckMetadata,
}
