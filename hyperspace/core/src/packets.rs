//! Proof and message construction for packet relay. Grounded on the teacher's
//! `packets-utils.rs` (`get_timeout_proof_height`, `verify_delay_passed`,
//! `construct_recv_message`, `construct_ack_message`, `construct_timeout_message`,
//! `KeyPathType`/`get_key_path`), generalised from the Substrate/parachain proof
//! format to the abstract `RawProof` of `hyperspace-primitives`.

use primitives::ack::Ack;
use primitives::chain::{ChainClient, IbcMessage};
use primitives::error::Error;
use primitives::height::Height;
use primitives::packet::Packet;

/// ICS-24 path kinds the Link needs proofs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPathType {
	SeqRecv,
	ReceiptPath,
	CommitmentPath,
	AcksPath,
	ChannelPath,
}

/// Builds the ICS-24 store path string for a given packet key.
pub fn get_key_path(kind: KeyPathType, port_id: &str, channel_id: &str, sequence: Option<u64>) -> String {
	match kind {
		KeyPathType::SeqRecv => format!("nextSequenceRecv/ports/{port_id}/channels/{channel_id}"),
		KeyPathType::ReceiptPath => format!(
			"receipts/ports/{port_id}/channels/{channel_id}/sequences/{}",
			sequence.unwrap_or_default()
		),
		KeyPathType::CommitmentPath => format!(
			"commitments/ports/{port_id}/channels/{channel_id}/sequences/{}",
			sequence.unwrap_or_default()
		),
		KeyPathType::AcksPath => format!(
			"acks/ports/{port_id}/channels/{channel_id}/sequences/{}",
			sequence.unwrap_or_default()
		),
		KeyPathType::ChannelPath => format!("channelEnds/ports/{port_id}/channels/{channel_id}"),
	}
}

/// `neededHeight = max(packet.height for packet in alive) + 1` (spec §4.D.2 step 5a).
pub fn get_timeout_proof_height(packet_heights: &[Height]) -> Option<Height> {
	packet_heights.iter().max().map(|h| h.increment())
}

/// `VerifyDelayOn`: which side's connection delay must be respected before a proof
/// submitted at a given height is considered final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyDelayOn {
	Source,
	Sink,
}

/// Verifies the connection-delay period required between a client update and the use
/// of the resulting height's proof has elapsed.
pub async fn verify_delay_passed(
	chain: &dyn ChainClient,
	client_id: &str,
	proof_height: Height,
	delay: std::time::Duration,
	_on: VerifyDelayOn,
) -> Result<bool, Error> {
	let consensus_state = chain.query_consensus_state(client_id, proof_height).await?;
	let now = chain.current_time_unix_nanos().await?;
	let elapsed = now.saturating_sub(consensus_state.timestamp);
	Ok(elapsed >= delay.as_nanos() as u64)
}

/// Builds a batched recv message for `packets`, proven at `proof_height - 1` (spec's
/// proof-height convention).
pub async fn construct_recv_message(
	src: &dyn ChainClient,
	packets: &[Packet],
	proof_height: Height,
) -> Result<Vec<IbcMessage>, Error> {
	let query_height = Height::new(proof_height.revision_number, proof_height.revision_height.saturating_sub(1));
	let mut msgs = Vec::with_capacity(packets.len());
	for packet in packets {
		let key = commitment_key(packet);
		let proof = src.query_raw_proof("ibc", &key, query_height).await?;
		proof.proof.check_and_parse(&key)?;
		msgs.push(IbcMessage::RecvPacket { packet: packet.clone(), proof });
	}
	Ok(msgs)
}

pub async fn construct_ack_message(
	src: &dyn ChainClient,
	acks: &[Ack],
	proof_height: Height,
) -> Result<Vec<IbcMessage>, Error> {
	let query_height = Height::new(proof_height.revision_number, proof_height.revision_height.saturating_sub(1));
	let mut msgs = Vec::with_capacity(acks.len());
	for ack in acks {
		let key = ack_key(ack);
		let proof = src.query_raw_proof("ibc", &key, query_height).await?;
		proof.proof.check_and_parse(&key)?;
		msgs.push(IbcMessage::Acknowledgement { ack: ack.clone(), proof });
	}
	Ok(msgs)
}

pub async fn construct_timeout_message(
	dest: &dyn ChainClient,
	packet: &Packet,
	proof_height: Height,
	next_sequence_recv: Option<u64>,
) -> Result<IbcMessage, Error> {
	let query_height = Height::new(proof_height.revision_number, proof_height.revision_height.saturating_sub(1));
	let key = receipt_key(packet);
	let proof = dest.query_raw_proof("ibc", &key, query_height).await?;
	proof.proof.check_and_parse(&key)?;
	Ok(IbcMessage::Timeout { packet: packet.clone(), proof, next_sequence_recv })
}

/// Whether `packet`'s commitment is still present on the chain it was sent from. A
/// missing commitment means the packet already timed out (spec §4.D.2 step 2).
pub async fn query_commitment_present(chain: &dyn ChainClient, packet: &Packet) -> Result<bool, Error> {
	let key = commitment_key(packet);
	let height = chain.current_height().await?;
	let proof = chain.query_raw_proof("ibc", &key, height).await?;
	Ok(proof.value.is_some())
}

/// Whether `packet` has already been received on the destination chain.
pub async fn query_receipt_present(chain: &dyn ChainClient, packet: &Packet) -> Result<bool, Error> {
	let key = receipt_key(packet);
	let height = chain.current_height().await?;
	let proof = chain.query_raw_proof("ibc", &key, height).await?;
	Ok(proof.value.is_some())
}

fn commitment_key(packet: &Packet) -> Vec<u8> {
	match packet {
		Packet::V1(p) => get_key_path(
			KeyPathType::CommitmentPath,
			&p.source_port,
			&p.source_channel,
			Some(p.sequence),
		)
		.into_bytes(),
		Packet::V2(p) => {
			format!("commitments/clients/{}/sequences/{}", p.source_client, p.sequence).into_bytes()
		},
	}
}

fn receipt_key(packet: &Packet) -> Vec<u8> {
	match packet {
		Packet::V1(p) => get_key_path(
			KeyPathType::ReceiptPath,
			&p.destination_port,
			&p.destination_channel,
			Some(p.sequence),
		)
		.into_bytes(),
		Packet::V2(p) => {
			format!("receipts/clients/{}/sequences/{}", p.destination_client, p.sequence).into_bytes()
		},
	}
}

fn ack_key(ack: &Ack) -> Vec<u8> {
	match &ack.original_packet {
		Packet::V1(p) => get_key_path(
			KeyPathType::AcksPath,
			&p.destination_port,
			&p.destination_channel,
			Some(p.sequence),
		)
		.into_bytes(),
		Packet::V2(p) => {
			format!("acks/clients/{}/sequences/{}", p.destination_client, p.sequence).into_bytes()
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn needed_height_is_max_plus_one() {
		let heights = vec![Height::new(0, 10), Height::new(0, 42), Height::new(0, 7)];
		assert_eq!(get_timeout_proof_height(&heights), Some(Height::new(0, 43)));
	}

	#[test]
	fn needed_height_none_for_empty() {
		assert_eq!(get_timeout_proof_height(&[]), None);
	}

	#[test]
	fn key_paths_embed_sequence() {
		let key = get_key_path(KeyPathType::CommitmentPath, "transfer", "channel-0", Some(5));
		assert_eq!(key, "commitments/ports/transfer/channels/channel-0/sequences/5");
	}
}
