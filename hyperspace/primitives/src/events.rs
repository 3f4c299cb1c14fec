use crate::ack::Ack;
use crate::error::Error;
use crate::height::Height;
use crate::packet::{Packet, PacketV1, PacketV2};
use std::collections::HashMap;

/// Chain events the core cares about. `query_events_by_range` returns these already
/// parsed from chain-native attribute maps.
#[derive(Debug, Clone)]
pub enum IbcEvent {
	SendPacket(Packet),
	WriteAcknowledgement(Ack),
	UpdateClient { client_id: String, consensus_height: Height },
}

/// Parses a raw `send_packet` attribute map (v1 shape) into a `Packet`. Rejects a
/// zero timeout-height (parsed as "absent" per convention) and missing required
/// attributes.
pub fn parse_send_packet_v1(attrs: &HashMap<String, String>) -> Result<Packet, Error> {
	let get = |key: &str| -> Result<String, Error> {
		attrs
			.get(key)
			.cloned()
			.ok_or_else(|| Error::ProtocolViolation(format!("send_packet missing attribute {key}")))
	};

	let sequence: u64 = get("packet_sequence")?
		.parse()
		.map_err(|_| Error::ProtocolViolation("invalid packet_sequence".into()))?;
	let source_port = get("packet_src_port")?;
	let source_channel = get("packet_src_channel")?;
	let destination_port = get("packet_dst_port")?;
	let destination_channel = get("packet_dst_channel")?;
	let data = hex::decode(get("packet_data_hex")?)
		.map_err(|_| Error::ProtocolViolation("packet_data_hex is not valid hex".into()))?;
	let timeout_height = match attrs.get("packet_timeout_height") {
		Some(raw) => parse_height_rev_height(raw)?.filter(|h| !h.is_zero()),
		None => None,
	};
	let timeout_timestamp: u64 = attrs
		.get("packet_timeout_timestamp")
		.map(|s| s.parse())
		.transpose()
		.map_err(|_| Error::ProtocolViolation("invalid packet_timeout_timestamp".into()))?
		.unwrap_or(0);

	Ok(Packet::V1(PacketV1 {
		sequence,
		source_port,
		source_channel,
		destination_port,
		destination_channel,
		data,
		timeout_height,
		timeout_timestamp,
	}))
}

/// Parses a `"rev-height"` formatted height string, e.g. `"0-1234"`.
fn parse_height_rev_height(raw: &str) -> Result<Option<Height>, Error> {
	let (rev, height) = raw
		.split_once('-')
		.ok_or_else(|| Error::ProtocolViolation(format!("malformed height {raw:?}")))?;
	let revision_number: u64 =
		rev.parse().map_err(|_| Error::ProtocolViolation(format!("malformed height {raw:?}")))?;
	let revision_height: u64 =
		height.parse().map_err(|_| Error::ProtocolViolation(format!("malformed height {raw:?}")))?;
	Ok(Some(Height::new(revision_number, revision_height)))
}

/// Parses a raw `write_acknowledgement` attribute map (v1 shape) into an `Ack`.
/// Same required-attribute and zero-timeout-height handling as `parse_send_packet_v1`,
/// plus the acknowledgement bytes and the metadata the chain client already knows
/// about the tx that wrote it (height, tx hash, event kinds).
pub fn parse_write_acknowledgement_v1(
	attrs: &HashMap<String, String>,
	height: Height,
	tx_hash: &str,
	tx_events: Vec<String>,
) -> Result<Ack, Error> {
	let original_packet = parse_send_packet_v1(attrs)?;
	let acknowledgement = hex::decode(
		attrs
			.get("packet_ack_hex")
			.ok_or_else(|| Error::ProtocolViolation("write_acknowledgement missing packet_ack_hex".into()))?,
	)
	.map_err(|_| Error::ProtocolViolation("packet_ack_hex is not valid hex".into()))?;

	Ok(Ack {
		original_packet,
		acknowledgement,
		metadata: crate::ack::AckMetadata { height, tx_hash: tx_hash.to_uppercase(), tx_events },
	})
}

pub fn parse_send_packet_v2(attrs: &HashMap<String, String>) -> Result<Packet, Error> {
	let get = |key: &str| -> Result<String, Error> {
		attrs
			.get(key)
			.cloned()
			.ok_or_else(|| Error::ProtocolViolation(format!("send_packet missing attribute {key}")))
	};
	let sequence: u64 = get("packet_sequence")?
		.parse()
		.map_err(|_| Error::ProtocolViolation("invalid packet_sequence".into()))?;
	let source_client = get("packet_src_client")?;
	let destination_client = get("packet_dst_client")?;
	let timeout_timestamp: u64 = get("packet_timeout_timestamp")?
		.parse()
		.map_err(|_| Error::ProtocolViolation("invalid packet_timeout_timestamp".into()))?;

	Ok(Packet::V2(PacketV2 {
		sequence,
		source_client,
		destination_client,
		timeout_timestamp,
		payloads: vec![],
	}))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn base_attrs() -> HashMap<String, String> {
		let mut m = HashMap::new();
		m.insert("packet_sequence".into(), "1".into());
		m.insert("packet_src_port".into(), "transfer".into());
		m.insert("packet_src_channel".into(), "channel-0".into());
		m.insert("packet_dst_port".into(), "transfer".into());
		m.insert("packet_dst_channel".into(), "channel-1".into());
		m.insert("packet_data_hex".into(), "ab".into());
		m
	}

	#[test]
	fn round_trips_a_known_packet() {
		let attrs = base_attrs();
		let packet = parse_send_packet_v1(&attrs).unwrap();
		assert_eq!(packet.sequence(), 1);
	}

	#[test]
	fn zero_timeout_height_is_absent() {
		let mut attrs = base_attrs();
		attrs.insert("packet_timeout_height".into(), "0-0".into());
		let packet = parse_send_packet_v1(&attrs).unwrap();
		match packet {
			Packet::V1(p) => assert!(p.timeout_height.is_none()),
			_ => unreachable!(),
		}
	}

	#[test]
	fn missing_required_attribute_errors() {
		let mut attrs = base_attrs();
		attrs.remove("packet_src_port");
		assert!(parse_send_packet_v1(&attrs).is_err());
	}

	#[test]
	fn parses_write_acknowledgement() {
		let mut attrs = base_attrs();
		attrs.insert("packet_ack_hex".into(), "01".into());
		let ack = parse_write_acknowledgement_v1(&attrs, Height::new(0, 5), "deadbeef", vec![]).unwrap();
		assert_eq!(ack.original_packet.sequence(), 1);
		assert_eq!(ack.acknowledgement, vec![1]);
		assert_eq!(ack.metadata.tx_hash, "DEADBEEF");
	}

	#[test]
	fn missing_ack_bytes_errors() {
		let attrs = base_attrs();
		assert!(parse_write_acknowledgement_v1(&attrs, Height::ZERO, "x", vec![]).is_err());
	}
}
