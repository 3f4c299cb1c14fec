//! Pairs a Chain Client with an on-chain client-id (and, for v1, a connection-id and
//! port/channel namespace). The sole point below the Link where v1/v2 branching
//! occurs (spec §4.B).

use crate::chain::AnyChainClient;
use primitives::chain::ChainClient;
use primitives::error::Error;
use primitives::events::IbcEvent;
use primitives::height::Height;
use primitives::packet::Packet;

#[derive(Debug, Clone)]
pub struct V1Namespace {
	pub connection_id: String,
	pub port_id: String,
	pub channel_id: String,
	pub ordered: bool,
}

pub struct Endpoint {
	pub client: AnyChainClient,
	pub client_id: String,
	/// `version = 1` iff this is `Some`.
	pub v1: Option<V1Namespace>,
}

impl Endpoint {
	pub fn new_v1(client: AnyChainClient, client_id: String, v1: V1Namespace) -> Self {
		Self { client, client_id, v1: Some(v1) }
	}

	pub fn new_v2(client: AnyChainClient, client_id: String) -> Self {
		Self { client, client_id, v1: None }
	}

	pub fn is_v1(&self) -> bool {
		self.v1.is_some()
	}

	/// `querySentPackets(min,max)` routed to the v1 or v2 event query, filtered down
	/// to `SendPacket` events addressed to this endpoint's namespace/client.
	pub async fn query_sent_packets(
		&self,
		min: Height,
		max: Option<Height>,
	) -> Result<Vec<Packet>, Error> {
		let events = self.client.query_events_by_range(min, max).await?;
		Ok(events
			.into_iter()
			.filter_map(|e| match e {
				IbcEvent::SendPacket(p) => self.packet_matches_namespace(&p).then_some(p),
				_ => None,
			})
			.collect())
	}

	/// `queryWrittenAcks(min,max)`.
	pub async fn query_written_acks(
		&self,
		min: Height,
		max: Option<Height>,
	) -> Result<Vec<primitives::ack::Ack>, Error> {
		let events = self.client.query_events_by_range(min, max).await?;
		Ok(events
			.into_iter()
			.filter_map(|e| match e {
				IbcEvent::WriteAcknowledgement(a) => {
					self.packet_matches_namespace(&a.original_packet).then_some(a)
				},
				_ => None,
			})
			.collect())
	}

	fn packet_matches_namespace(&self, packet: &Packet) -> bool {
		match (&self.v1, packet) {
			(Some(ns), Packet::V1(p)) => {
				p.source_port == ns.port_id || p.destination_port == ns.port_id
					|| p.source_channel == ns.channel_id
					|| p.destination_channel == ns.channel_id
			},
			(None, Packet::V2(p)) => {
				p.source_client == self.client_id || p.destination_client == self.client_id
			},
			_ => false,
		}
	}
}
