use crate::chain_id::ChainId;
use crate::client_state::{ClientState, ConsensusState, Header, RawProof};
use crate::connection::{Channel, Connection, CounterpartyRegistration};
use crate::error::Error;
use crate::events::IbcEvent;
use crate::height::Height;
use async_trait::async_trait;
use std::time::Duration;

/// Opaque façade over a chain family. Every chain variant implements this; unsupported
/// operations (e.g. v1 handshake ops on a v2-only chain) fail with `Error::Unsupported`
/// rather than panicking, per spec §4.A.
#[async_trait]
pub trait ChainClient: Send + Sync {
	fn chain_id(&self) -> ChainId;

	fn client_id(&self) -> Option<String>;

	fn set_client_id(&mut self, client_id: String);

	/// A conservative upper bound on block production time, used for stall detection
	/// and indexer-lag back-off.
	fn expected_block_time(&self) -> Duration;

	/// A conservative upper bound on the lag between a tx landing and its events
	/// becoming queryable.
	fn estimated_indexer_time(&self) -> Duration;

	/// Latest finalised height.
	async fn current_height(&self) -> Result<Height, Error>;

	/// Current chain time, as Unix nanoseconds.
	async fn current_time_unix_nanos(&self) -> Result<u64, Error>;

	/// Blocks until `current_height` strictly advances, bounded by
	/// `expected_block_time * 2 + 1s` before failing with `Error::Stalled`.
	async fn wait_one_block(&self) -> Result<Height, Error> {
		let start = self.current_height().await?;
		let deadline = self.expected_block_time() * 2 + Duration::from_secs(1);
		let poll_interval = Duration::from_millis(250).min(self.expected_block_time());
		let waited = tokio::time::Instant::now();
		loop {
			let now = self.current_height().await?;
			if now > start {
				return Ok(now);
			}
			if waited.elapsed() >= deadline {
				return Err(Error::Stalled {
					chain_id: self.chain_id().to_string(),
					waited_secs: deadline.as_secs(),
				});
			}
			tokio::time::sleep(poll_interval).await;
		}
	}

	/// Sleeps `estimated_indexer_time`, a conservative bound on tx-to-event lag.
	async fn wait_for_indexer(&self) {
		tokio::time::sleep(self.estimated_indexer_time()).await;
	}

	async fn unbonding_period(&self) -> Result<Duration, Error>;

	/// Spec §4.A "Revision-number discipline": every `Height` this chain is asked
	/// to act on must carry this chain's own revision number, or a proof/header
	/// built at it would silently apply to the wrong chain. `Height::ZERO` is the
	/// "unknown/lowest" sentinel and is exempt.
	fn check_height_revision(&self, height: Height) -> Result<(), Error> {
		if height.is_zero() || height.revision_number == self.chain_id().revision_number() {
			Ok(())
		} else {
			Err(Error::RevisionMismatch { chain_id: self.chain_id().to_string(), height })
		}
	}

	async fn query_header(&self, height: Height) -> Result<Header, Error>;

	async fn query_consensus_state(
		&self,
		client_id: &str,
		height: Height,
	) -> Result<ConsensusState, Error>;

	async fn query_client_state(&self, client_id: &str) -> Result<ClientState, Error>;

	/// Proofs are queried at `proof_height - 1`: the apphash proving state at H is
	/// stored in header H+1, so the proof must be taken against the parent root.
	async fn query_raw_proof(
		&self,
		store_name: &str,
		key: &[u8],
		proof_height: Height,
	) -> Result<RawProof, Error>;

	async fn query_events_by_range(
		&self,
		min_height: Height,
		max_height: Option<Height>,
	) -> Result<Vec<IbcEvent>, Error>;

	/// Atomic per-tx: all messages commit or none do. On failure, surfaces the chain
	/// error code and raw log verbatim.
	async fn submit_ibc_msgs(&self, msgs: Vec<IbcMessage>) -> Result<TxResult, Error>;

	async fn build_consensus_state(&self, header: &Header) -> Result<ConsensusState, Error>;

	async fn build_client_state(
		&self,
		latest_header: &Header,
		unbonding_period: Duration,
		trusting_period: Duration,
	) -> Result<ClientState, Error>;

	async fn build_header_update(
		&self,
		trusted_height: Height,
		target_height: Height,
	) -> Result<Header, Error>;

	/// v2 only: binds `local` to `remote` behind a merkle prefix. v1-only chains
	/// return `Error::Unsupported`.
	async fn register_counterparty(
		&self,
		local_client_id: &str,
		remote_client_id: &str,
		merkle_prefix: &[u8],
	) -> Result<(), Error>;

	/// v1 only: current handshake state of a connection. Chain families without
	/// a v1 handshake return `Error::Unsupported`.
	async fn query_connection(&self, connection_id: &str) -> Result<Connection, Error> {
		let _ = connection_id;
		Err(Error::Unsupported {
			chain_id: self.chain_id().to_string(),
			operation: "queryConnection".into(),
		})
	}

	/// v1 only: current handshake state of a channel.
	async fn query_channel(&self, port_id: &str, channel_id: &str) -> Result<Channel, Error> {
		let _ = (port_id, channel_id);
		Err(Error::Unsupported {
			chain_id: self.chain_id().to_string(),
			operation: "queryChannel".into(),
		})
	}

	/// v2 only: the counterparty registration this chain holds for `client_id`.
	async fn query_counterparty(&self, client_id: &str) -> Result<CounterpartyRegistration, Error> {
		let _ = client_id;
		Err(Error::Unsupported {
			chain_id: self.chain_id().to_string(),
			operation: "queryCounterparty".into(),
		})
	}

	fn ibc_version_supported(&self, version: u8) -> bool;
}

#[derive(Debug, Clone)]
pub enum IbcMessage {
	CreateClient { client_state: ClientState, consensus_state: ConsensusState },
	UpdateClient { client_id: String, header: Header },
	ConnOpenInit { client_id: String, counterparty_client_id: String },
	ConnOpenTry { client_id: String, counterparty_client_id: String, counterparty_connection_id: String },
	ConnOpenAck { connection_id: String, counterparty_connection_id: String },
	ConnOpenConfirm { connection_id: String },
	ChanOpenInit { port_id: String, connection_id: String, version: String },
	ChanOpenTry { port_id: String, connection_id: String, counterparty_channel_id: String, version: String },
	ChanOpenAck { port_id: String, channel_id: String, counterparty_channel_id: String },
	ChanOpenConfirm { port_id: String, channel_id: String },
	RegisterCounterparty { local_client_id: String, remote_client_id: String, merkle_prefix: Vec<u8> },
	RecvPacket { packet: crate::packet::Packet, proof: RawProof },
	Acknowledgement { ack: crate::ack::Ack, proof: RawProof },
	Timeout { packet: crate::packet::Packet, proof: RawProof, next_sequence_recv: Option<u64> },
}

#[derive(Debug, Clone)]
pub struct TxResult {
	pub tx_hash: String,
	pub height: Height,
	pub code: u32,
	pub raw_log: String,
}

impl TxResult {
	pub fn is_ok(&self) -> bool {
		self.code == 0
	}
}

/// Fatal misbehaviour handling: a chain that observes a divergent header for a
/// counterparty it tracks reports it so the driver can freeze the client.
#[async_trait]
pub trait MisbehaviourHandler: Send + Sync {
	async fn check_for_misbehaviour(&self, counterparty_header: &Header) -> Result<bool, Error>;
}
