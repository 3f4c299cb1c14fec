//! The relay state machine: a bidirectional pair of light-client-backed endpoints
//! orchestrating a correct, idempotent relay round. v1 and v2 share this skeleton,
//! differing only in a small set of hooks (proof builders, submit functions,
//! unreceived queries, id functions), the same tagged-variant-over-dynamic-dispatch
//! approach used for chain families applied at the Link level.

use crate::endpoint::Endpoint;
use crate::light_client::LightClientDriver;
use crate::packets::{
	construct_ack_message, construct_recv_message, construct_timeout_message,
	get_timeout_proof_height, query_commitment_present, query_receipt_present,
};
use primitives::chain::ChainClient;
use primitives::error::Error;
use primitives::height::Height;
use primitives::packet::{split_pending_packets, Packet};
use primitives::relay_path::IbcVersion;
use primitives::watermark::Watermark;
use std::sync::Arc;

pub type PacketFilter = Arc<dyn Fn(&Packet) -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
	New,
	Constructed,
	Running,
	Paused,
	Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	AtoB,
	BtoA,
}

/// Caller-configured slack applied to timeout cutoffs so packets on the verge are
/// preferred to alive over timed-out (spec §4.D.2 step 4).
#[derive(Debug, Clone, Copy)]
pub struct RoundConfig {
	pub timeout_blocks_slack: u64,
	pub timeout_seconds_slack: u64,
}

pub struct Link {
	pub version: IbcVersion,
	pub end_a: Endpoint,
	pub end_b: Endpoint,
	pub packet_filter: Option<PacketFilter>,
	pub light_client: LightClientDriver,
	pub state: LinkState,
}

impl Link {
	pub fn new(version: IbcVersion, end_a: Endpoint, end_b: Endpoint, packet_filter: Option<PacketFilter>) -> Self {
		Self { version, end_a, end_b, packet_filter, light_client: LightClientDriver::new(), state: LinkState::New }
	}

	fn endpoints(&self, direction: Direction) -> (&Endpoint, &Endpoint) {
		match direction {
			Direction::AtoB => (&self.end_a, &self.end_b),
			Direction::BtoA => (&self.end_b, &self.end_a),
		}
	}

	/// One tick for `direction`, in ten steps: observe watermarks, discover pending
	/// packets, filter, split by timeout, submit recvs, wait for indexers, discover
	/// acks, submit acks, submit timeouts, persist new watermarks. Both directions
	/// of a Link share no in-flight state and may run concurrently.
	pub async fn relay_round(
		&self,
		direction: Direction,
		watermark: Watermark,
		cfg: RoundConfig,
	) -> Result<Watermark, Error> {
		let (src_end, dest_end) = self.endpoints(direction);
		let src = &src_end.client;
		let dest = &dest_end.client;

		// Step 1: observe watermarks, capture current heights before discovery.
		let (packet_cursor, ack_cursor) = match direction {
			Direction::AtoB => (watermark.packet_height_a, watermark.ack_height_b),
			Direction::BtoA => (watermark.packet_height_b, watermark.ack_height_a),
		};
		let hcur_src = src.current_height().await?;
		let hcur_dest = dest.current_height().await?;

		// Step 2: discover pending packets with a small back-lookup to absorb
		// reorg/indexer lag, keep only those not yet received and still committed.
		let lookback = Height::new(
			packet_cursor.revision_number,
			packet_cursor.revision_height.saturating_sub(2),
		);
		let candidates = src_end.query_sent_packets(lookback, None).await?;
		let mut pending = Vec::with_capacity(candidates.len());
		for packet in candidates {
			if query_receipt_present(dest, &packet).await? {
				continue;
			}
			if !query_commitment_present(src, &packet).await? {
				continue;
			}
			pending.push(packet);
		}

		// Step 3: apply the injectable packet filter.
		if let Some(filter) = &self.packet_filter {
			pending.retain(|p| filter(p));
		}

		// Step 4: split by timeout against the destination's current height/time.
		let dest_time = dest.current_time_unix_nanos().await?;
		let (alive, timed_out) = split_pending_packets(
			pending,
			hcur_dest,
			dest_time,
			cfg.timeout_blocks_slack,
			cfg.timeout_seconds_slack,
		);
		self.assert_ordering(direction, &alive)?;

		// Step 5: submit recv on dest.
		if !alive.is_empty() {
			let heights: Vec<Height> = alive.iter().map(|_| hcur_src).collect();
			let needed_height = get_timeout_proof_height(&heights).expect("alive is non-empty");
			self.light_client.update_client(src, dest, &dest_end.client_id, needed_height).await?;
			let msgs = construct_recv_message(src, &alive, needed_height).await?;
			let tx = dest.submit_ibc_msgs(msgs).await?;
			if !tx.is_ok() {
				return Err(Error::ChainRejected {
					chain_id: dest.chain_id().to_string(),
					tx_hash: tx.tx_hash,
					height: tx.height,
					code: tx.code,
					raw_log: tx.raw_log,
				});
			}
		}

		// Step 6: wait for both chains' indexers before looking for the effects of
		// what was just submitted.
		src.wait_for_indexer().await;
		dest.wait_for_indexer().await;

		// Step 7: discover acks written on dest, keep only those whose packet is
		// still unprocessed (commitment still present) on src.
		let ack_lookback =
			Height::new(ack_cursor.revision_number, ack_cursor.revision_height.saturating_sub(2));
		let candidate_acks = dest_end.query_written_acks(ack_lookback, None).await?;
		let mut acks = Vec::with_capacity(candidate_acks.len());
		for ack in candidate_acks {
			if query_commitment_present(src, &ack.original_packet).await? {
				acks.push(ack);
			}
		}

		// Step 8: submit acks on src.
		if !acks.is_empty() {
			let ack_heights: Vec<Height> = acks.iter().map(|a| a.metadata.height).collect();
			let ack_height = get_timeout_proof_height(&ack_heights).expect("acks is non-empty");
			self.light_client.update_client(dest, src, &src_end.client_id, ack_height).await?;
			let msgs = construct_ack_message(dest, &acks, ack_height).await?;
			let tx = src.submit_ibc_msgs(msgs).await?;
			if !tx.is_ok() {
				return Err(Error::ChainRejected {
					chain_id: src.chain_id().to_string(),
					tx_hash: tx.tx_hash,
					height: tx.height,
					code: tx.code,
					raw_log: tx.raw_log,
				});
			}
		}

		// Step 9: submit timeouts on src for packets the destination never received
		// in time. Needs a fresh proof of non-receipt on dest, so dest is advanced
		// first and src's view of dest is updated to that height.
		for packet in &timed_out {
			let fresh = dest.wait_one_block().await?;
			self.light_client.update_client(dest, src, &src_end.client_id, fresh).await?;
			let next_sequence_recv = if src_end.is_v1() { Some(packet.sequence()) } else { None };
			let msg = construct_timeout_message(dest, packet, fresh, next_sequence_recv).await?;
			let tx = src.submit_ibc_msgs(vec![msg]).await?;
			if !tx.is_ok() {
				return Err(Error::ChainRejected {
					chain_id: src.chain_id().to_string(),
					tx_hash: tx.tx_hash,
					height: tx.height,
					code: tx.code,
					raw_log: tx.raw_log,
				});
			}
		}

		// Step 10: persist new watermarks, strictly monotone on success.
		let mut next = watermark;
		match direction {
			Direction::AtoB => {
				next.packet_height_a = hcur_src;
				next.ack_height_b = hcur_dest;
			},
			Direction::BtoA => {
				next.packet_height_b = hcur_src;
				next.ack_height_a = hcur_dest;
			},
		}
		Ok(next)
	}

	/// v1 ordered channels must submit in strictly increasing sequence and fail the
	/// whole batch on a gap; v1 unordered and v2 channels have no such requirement.
	fn assert_ordering(&self, direction: Direction, alive: &[Packet]) -> Result<(), Error> {
		let (src_end, _) = self.endpoints(direction);
		let Some(ns) = &src_end.v1 else { return Ok(()) };
		if !ns.ordered {
			return Ok(());
		}
		let mut last = None;
		for packet in alive {
			let seq = packet.sequence();
			if let Some(prev) = last {
				if seq != prev + 1 {
					return Err(Error::ProtocolViolation(format!(
						"ordered channel {} has a sequence gap: {prev} then {seq}",
						ns.channel_id
					)));
				}
			}
			last = Some(seq);
		}
		Ok(())
	}

	/// Runs both directions of a round concurrently, since they share no in-flight
	/// state.
	pub async fn relay_round_both_directions(
		&self,
		watermark: Watermark,
		cfg: RoundConfig,
	) -> Result<Watermark, Error> {
		let (a_to_b, b_to_a) =
			tokio::join!(self.relay_round(Direction::AtoB, watermark, cfg), self.relay_round(Direction::BtoA, watermark, cfg));
		let after_ab = a_to_b?;
		let after_ba = b_to_a?;
		Ok(Watermark {
			packet_height_a: after_ab.packet_height_a,
			ack_height_a: after_ba.ack_height_a,
			packet_height_b: after_ba.packet_height_b,
			ack_height_b: after_ab.ack_height_b,
		})
	}
}
