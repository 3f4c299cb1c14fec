//! In-memory `ChainClient` used by unit and integration tests across the workspace.
//! Mirrors enough on-chain state (commitments, receipts, consensus states, a block
//! clock) to exercise the Relay Engine without a real chain.

use crate::ack::{Ack, AckMetadata};
use crate::chain::{ChainClient, IbcMessage, TxResult};
use crate::chain_id::ChainId;
use crate::client_state::{
	ClientState, CommitmentProof, CommitmentProofOp, ConsensusState, Header, MerkleProof, ProofSpec,
	RawProof, ValidatorSet,
};
use crate::connection::{Channel, ChannelState, Connection, ConnectionState, CounterpartyRegistration};
use crate::error::Error;
use crate::events::IbcEvent;
use crate::height::Height;
use crate::packet::Packet;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Inner {
	height: u64,
	time_unix_nanos: u64,
	/// packet commitments still pending on this chain, keyed by sequence
	commitments: HashSet<u64>,
	/// packets this chain has received, keyed by sequence
	receipts: HashSet<u64>,
	/// acks this chain has written, keyed by sequence
	acks: BTreeMap<u64, Vec<u8>>,
	events: Vec<(u64, IbcEvent)>,
	consensus_states: BTreeMap<String, ConsensusState>,
	client_states: BTreeMap<String, ClientState>,
	client_id: Option<String>,
	connections: HashMap<String, Connection>,
	channels: HashMap<(String, String), Channel>,
	counterparties: HashMap<String, CounterpartyRegistration>,
}

#[derive(Clone)]
pub struct MockChainClient {
	chain_id: ChainId,
	inner: Arc<Mutex<Inner>>,
}

impl MockChainClient {
	pub fn new(chain_id: impl Into<ChainId>) -> Self {
		let mut inner = Inner::default();
		inner.height = 1;
		Self { chain_id: chain_id.into(), inner: Arc::new(Mutex::new(inner)) }
	}

	/// Test hook: enqueue a packet send as if observed on-chain.
	pub fn send_packet(&self, packet: Packet) {
		let mut inner = self.inner.lock().unwrap();
		inner.commitments.insert(packet.sequence());
		let height = inner.height;
		inner.events.push((height, IbcEvent::SendPacket(packet)));
	}

	pub fn advance_block(&self) -> Height {
		let mut inner = self.inner.lock().unwrap();
		inner.height += 1;
		inner.time_unix_nanos += 5_000_000_000;
		Height::new(0, inner.height)
	}

	pub fn advance_time(&self, by: Duration) {
		let mut inner = self.inner.lock().unwrap();
		inner.time_unix_nanos += by.as_nanos() as u64;
	}

	pub fn has_commitment(&self, sequence: u64) -> bool {
		self.inner.lock().unwrap().commitments.contains(&sequence)
	}

	pub fn has_receipt(&self, sequence: u64) -> bool {
		self.inner.lock().unwrap().receipts.contains(&sequence)
	}

	/// Test hook: seed a connection directly, bypassing the handshake, for tests
	/// that exercise `with_existing_connections` reconstruction.
	pub fn set_connection(&self, connection_id: impl Into<String>, connection: Connection) {
		self.inner.lock().unwrap().connections.insert(connection_id.into(), connection);
	}

	/// Test hook: seed a channel directly, bypassing the handshake.
	pub fn set_channel(&self, port_id: impl Into<String>, channel_id: impl Into<String>, channel: Channel) {
		self.inner.lock().unwrap().channels.insert((port_id.into(), channel_id.into()), channel);
	}

	/// Test hook: seed a client state directly, used alongside `set_connection`
	/// to build an already-open v1 link without running the handshake.
	pub fn set_client_state(&self, client_id: impl Into<String>, client_state: ClientState) {
		self.inner.lock().unwrap().client_states.insert(client_id.into(), client_state);
	}

	/// Test hook: seed a consensus state directly, paired with `set_client_state`
	/// so `assert_headers_match_consensus_state` has something to compare against
	/// when reconstructing a link without running a handshake.
	pub fn set_consensus_state(&self, client_id: impl Into<String>, consensus_state: ConsensusState) {
		self.inner.lock().unwrap().consensus_states.insert(client_id.into(), consensus_state);
	}

	/// Test hook: seed a counterparty registration directly, for v2 link
	/// reconstruction tests that bypass `register_counterparty`.
	pub fn set_counterparty(&self, client_id: impl Into<String>, registration: CounterpartyRegistration) {
		self.inner.lock().unwrap().counterparties.insert(client_id.into(), registration);
	}
}

#[async_trait]
impl ChainClient for MockChainClient {
	fn chain_id(&self) -> ChainId {
		self.chain_id.clone()
	}

	fn client_id(&self) -> Option<String> {
		self.inner.lock().unwrap().client_id.clone()
	}

	fn set_client_id(&mut self, client_id: String) {
		self.inner.lock().unwrap().client_id = Some(client_id);
	}

	fn expected_block_time(&self) -> Duration {
		Duration::from_millis(50)
	}

	fn estimated_indexer_time(&self) -> Duration {
		Duration::from_millis(10)
	}

	async fn current_height(&self) -> Result<Height, Error> {
		Ok(Height::new(0, self.inner.lock().unwrap().height))
	}

	async fn current_time_unix_nanos(&self) -> Result<u64, Error> {
		Ok(self.inner.lock().unwrap().time_unix_nanos)
	}

	async fn unbonding_period(&self) -> Result<Duration, Error> {
		Ok(Duration::from_secs(3 * 7 * 24 * 3600))
	}

	async fn query_header(&self, height: Height) -> Result<Header, Error> {
		let inner = self.inner.lock().unwrap();
		Ok(Header {
			signed_header_height: height,
			validator_set: ValidatorSet { hash: vec![1, 2, 3] },
			trusted_height: Height::new(height.revision_number, height.revision_height.saturating_sub(1)),
			trusted_validators: ValidatorSet { hash: vec![1, 2, 3] },
			timestamp: inner.time_unix_nanos,
			app_hash: vec![0xAB; 32],
			next_validators_hash: vec![1, 2, 3],
		})
	}

	async fn query_consensus_state(
		&self,
		client_id: &str,
		_height: Height,
	) -> Result<ConsensusState, Error> {
		self.inner
			.lock()
			.unwrap()
			.consensus_states
			.get(client_id)
			.cloned()
			.ok_or_else(|| Error::Store(format!("no consensus state for {client_id}")))
	}

	async fn query_client_state(&self, client_id: &str) -> Result<ClientState, Error> {
		self.inner
			.lock()
			.unwrap()
			.client_states
			.get(client_id)
			.cloned()
			.ok_or_else(|| Error::Store(format!("no client state for {client_id}")))
	}

	async fn query_raw_proof(
		&self,
		_store_name: &str,
		key: &[u8],
		proof_height: Height,
	) -> Result<RawProof, Error> {
		let inner = self.inner.lock().unwrap();
		let key_str = String::from_utf8_lossy(key);
		let sequence = key_str.rsplit('/').next().and_then(|s| s.parse::<u64>().ok());
		let value = if key_str.starts_with("commitments") {
			sequence.filter(|s| inner.commitments.contains(s)).map(|_| vec![1])
		} else if key_str.starts_with("receipts") {
			sequence.filter(|s| inner.receipts.contains(s)).map(|_| vec![1])
		} else if key_str.starts_with("acks") {
			sequence.and_then(|s| inner.acks.get(&s)).cloned()
		} else {
			Some(vec![1])
		};
		Ok(RawProof {
			value,
			height: proof_height,
			proof: MerkleProof {
				proofs: vec![
					CommitmentProof { op_type: CommitmentProofOp::Leaf, key: key.to_vec() },
					CommitmentProof { op_type: CommitmentProofOp::Meta, key: b"meta".to_vec() },
				],
			},
		})
	}

	async fn query_events_by_range(
		&self,
		min_height: Height,
		max_height: Option<Height>,
	) -> Result<Vec<IbcEvent>, Error> {
		let inner = self.inner.lock().unwrap();
		Ok(inner
			.events
			.iter()
			.filter(|(h, _)| {
				*h >= min_height.revision_height
					&& max_height.map(|mh| *h <= mh.revision_height).unwrap_or(true)
			})
			.map(|(_, e)| e.clone())
			.collect())
	}

	async fn submit_ibc_msgs(&self, msgs: Vec<IbcMessage>) -> Result<TxResult, Error> {
		let mut inner = self.inner.lock().unwrap();
		let height = inner.height;
		for msg in msgs {
			match msg {
				IbcMessage::RecvPacket { packet, .. } => {
					inner.receipts.insert(packet.sequence());
					let ack = Ack {
						original_packet: packet.clone(),
						acknowledgement: vec![1],
						metadata: AckMetadata {
							height: Height::new(0, height),
							tx_hash: "MOCK".into(),
							tx_events: vec![],
						},
					};
					inner.acks.insert(packet.sequence(), ack.acknowledgement.clone());
					inner.events.push((height, IbcEvent::WriteAcknowledgement(ack)));
				},
				IbcMessage::Acknowledgement { ack, .. } => {
					inner.commitments.remove(&ack.original_packet.sequence());
				},
				IbcMessage::Timeout { packet, .. } => {
					inner.commitments.remove(&packet.sequence());
				},
				IbcMessage::UpdateClient { client_id, header } => {
					inner.consensus_states.insert(
						client_id.clone(),
						ConsensusState {
							timestamp: header.timestamp,
							root: header.app_hash.clone(),
							next_validators_hash: header.next_validators_hash.clone(),
						},
					);
					if let Some(cs) = inner.client_states.get_mut(&client_id) {
						cs.latest_height = header.signed_header_height;
					}
				},
				IbcMessage::CreateClient { client_state, consensus_state } => {
					// Matches `LightClientDriver::create_client`'s
					// `"07-tendermint-{tx.height}"` naming convention so the id it
					// returns resolves back to the state just inserted here.
					let id = format!("07-tendermint-{height}");
					inner.consensus_states.insert(id.clone(), consensus_state);
					inner.client_states.insert(id, client_state);
				},
				IbcMessage::ConnOpenInit { client_id, counterparty_client_id } => {
					let connection_id = format!("connection-{height}");
					inner.connections.insert(
						connection_id,
						Connection {
							state: ConnectionState::Init,
							client_id,
							counterparty_client_id,
							counterparty_connection_id: None,
						},
					);
				},
				IbcMessage::ConnOpenTry { client_id, counterparty_client_id, counterparty_connection_id } => {
					let connection_id = format!("connection-{height}");
					inner.connections.insert(
						connection_id,
						Connection {
							state: ConnectionState::TryOpen,
							client_id,
							counterparty_client_id,
							counterparty_connection_id: Some(counterparty_connection_id),
						},
					);
				},
				IbcMessage::ConnOpenAck { connection_id, counterparty_connection_id } => {
					if let Some(conn) = inner.connections.get_mut(&connection_id) {
						conn.state = ConnectionState::Open;
						conn.counterparty_connection_id = Some(counterparty_connection_id);
					}
				},
				IbcMessage::ConnOpenConfirm { connection_id } => {
					if let Some(conn) = inner.connections.get_mut(&connection_id) {
						conn.state = ConnectionState::Open;
					}
				},
				IbcMessage::ChanOpenInit { port_id, version, .. } => {
					let channel_id = format!("channel-{height}");
					inner.channels.insert(
						(port_id.clone(), channel_id),
						Channel {
							state: ChannelState::Init,
							ordering_ordered: false,
							counterparty_port_id: port_id,
							counterparty_channel_id: None,
							version,
						},
					);
				},
				IbcMessage::ChanOpenTry { port_id, counterparty_channel_id, version, .. } => {
					let channel_id = format!("channel-{height}");
					inner.channels.insert(
						(port_id.clone(), channel_id),
						Channel {
							state: ChannelState::TryOpen,
							ordering_ordered: false,
							counterparty_port_id: port_id,
							counterparty_channel_id: Some(counterparty_channel_id),
							version,
						},
					);
				},
				IbcMessage::ChanOpenAck { port_id, channel_id, counterparty_channel_id } => {
					if let Some(chan) = inner.channels.get_mut(&(port_id, channel_id)) {
						chan.state = ChannelState::Open;
						chan.counterparty_channel_id = Some(counterparty_channel_id);
					}
				},
				IbcMessage::ChanOpenConfirm { port_id, channel_id } => {
					if let Some(chan) = inner.channels.get_mut(&(port_id, channel_id)) {
						chan.state = ChannelState::Open;
					}
				},
				IbcMessage::RegisterCounterparty { local_client_id, remote_client_id, merkle_prefix } => {
					inner.counterparties.insert(
						local_client_id.clone(),
						CounterpartyRegistration {
							client_id_local: local_client_id,
							client_id_remote: remote_client_id,
							merkle_prefix,
						},
					);
				},
				_ => {},
			}
		}
		Ok(TxResult { tx_hash: "MOCK".into(), height: Height::new(0, height), code: 0, raw_log: String::new() })
	}

	async fn build_consensus_state(&self, header: &Header) -> Result<ConsensusState, Error> {
		Ok(ConsensusState {
			timestamp: header.timestamp,
			root: header.app_hash.clone(),
			next_validators_hash: header.next_validators_hash.clone(),
		})
	}

	async fn build_client_state(
		&self,
		latest_header: &Header,
		unbonding_period: Duration,
		trusting_period: Duration,
	) -> Result<ClientState, Error> {
		Ok(ClientState {
			chain_id: self.chain_id.clone(),
			trust_level: (1, 3),
			unbonding_period,
			trusting_period,
			max_clock_drift: Duration::from_secs(20),
			latest_height: latest_header.signed_header_height,
			proof_specs: vec![ProofSpec::Iavl, ProofSpec::Tendermint],
			upgrade_path: vec!["upgrade".into(), "upgradedIBCState".into()],
		})
	}

	async fn build_header_update(
		&self,
		trusted_height: Height,
		target_height: Height,
	) -> Result<Header, Error> {
		let inner = self.inner.lock().unwrap();
		Ok(Header {
			signed_header_height: target_height,
			validator_set: ValidatorSet { hash: vec![1, 2, 3] },
			trusted_height,
			trusted_validators: ValidatorSet { hash: vec![1, 2, 3] },
			timestamp: inner.time_unix_nanos,
			app_hash: vec![0xAB; 32],
			next_validators_hash: vec![1, 2, 3],
		})
	}

	async fn register_counterparty(
		&self,
		local_client_id: &str,
		remote_client_id: &str,
		merkle_prefix: &[u8],
	) -> Result<(), Error> {
		self.inner.lock().unwrap().counterparties.insert(
			local_client_id.to_string(),
			CounterpartyRegistration {
				client_id_local: local_client_id.to_string(),
				client_id_remote: remote_client_id.to_string(),
				merkle_prefix: merkle_prefix.to_vec(),
			},
		);
		Ok(())
	}

	async fn query_connection(&self, connection_id: &str) -> Result<Connection, Error> {
		self.inner
			.lock()
			.unwrap()
			.connections
			.get(connection_id)
			.cloned()
			.ok_or_else(|| Error::Store(format!("no connection {connection_id}")))
	}

	async fn query_channel(&self, port_id: &str, channel_id: &str) -> Result<Channel, Error> {
		self.inner
			.lock()
			.unwrap()
			.channels
			.get(&(port_id.to_string(), channel_id.to_string()))
			.cloned()
			.ok_or_else(|| Error::Store(format!("no channel {port_id}/{channel_id}")))
	}

	async fn query_counterparty(&self, client_id: &str) -> Result<CounterpartyRegistration, Error> {
		self.inner
			.lock()
			.unwrap()
			.counterparties
			.get(client_id)
			.cloned()
			.ok_or_else(|| Error::Store(format!("no counterparty registered for {client_id}")))
	}

	fn ibc_version_supported(&self, _version: u8) -> bool {
		true
	}
}
