//! Tagged union over the supported chain families. Closed set, capability interface,
//! `Error::Unsupported` for operations a variant cannot perform.

use async_trait::async_trait;
use primitives::chain::{ChainClient, IbcMessage, TxResult};
use primitives::chain_id::ChainId;
use primitives::client_state::{ClientState, ConsensusState, Header, RawProof};
use primitives::connection::{Channel, Connection, CounterpartyRegistration};
use primitives::error::Error;
use primitives::events::IbcEvent;
use primitives::height::Height;
use std::time::Duration;

#[cfg(feature = "cosmos")]
use cosmos::CosmosClient;
#[cfg(feature = "gno")]
use gno::GnoClient;
#[cfg(feature = "testing")]
use primitives::mock::MockChainClient;

pub enum AnyChainClient {
	#[cfg(feature = "cosmos")]
	Cosmos(CosmosClient),
	#[cfg(feature = "gno")]
	Gno(GnoClient),
	/// In-memory chain used by the testsuite to exercise the Relay Engine without
	/// a real chain, behind the same tagged-union dispatch as the real variants.
	#[cfg(feature = "testing")]
	Mock(MockChainClient),
}

macro_rules! dispatch {
	($self:ident, $method:ident $(, $arg:expr)*) => {
		match $self {
			#[cfg(feature = "cosmos")]
			AnyChainClient::Cosmos(c) => c.$method($($arg),*),
			#[cfg(feature = "gno")]
			AnyChainClient::Gno(c) => c.$method($($arg),*),
			#[cfg(feature = "testing")]
			AnyChainClient::Mock(c) => c.$method($($arg),*),
		}
	};
}

macro_rules! dispatch_await {
	($self:ident, $method:ident $(, $arg:expr)*) => {
		match $self {
			#[cfg(feature = "cosmos")]
			AnyChainClient::Cosmos(c) => c.$method($($arg),*).await,
			#[cfg(feature = "gno")]
			AnyChainClient::Gno(c) => c.$method($($arg),*).await,
			#[cfg(feature = "testing")]
			AnyChainClient::Mock(c) => c.$method($($arg),*).await,
		}
	};
}

#[async_trait]
impl ChainClient for AnyChainClient {
	fn chain_id(&self) -> ChainId {
		dispatch!(self, chain_id)
	}

	fn client_id(&self) -> Option<String> {
		dispatch!(self, client_id)
	}

	fn set_client_id(&mut self, client_id: String) {
		match self {
			#[cfg(feature = "cosmos")]
			AnyChainClient::Cosmos(c) => c.set_client_id(client_id),
			#[cfg(feature = "gno")]
			AnyChainClient::Gno(c) => c.set_client_id(client_id),
			#[cfg(feature = "testing")]
			AnyChainClient::Mock(c) => c.set_client_id(client_id),
		}
	}

	fn expected_block_time(&self) -> Duration {
		dispatch!(self, expected_block_time)
	}

	fn estimated_indexer_time(&self) -> Duration {
		dispatch!(self, estimated_indexer_time)
	}

	async fn current_height(&self) -> Result<Height, Error> {
		dispatch_await!(self, current_height)
	}

	async fn current_time_unix_nanos(&self) -> Result<u64, Error> {
		dispatch_await!(self, current_time_unix_nanos)
	}

	async fn unbonding_period(&self) -> Result<Duration, Error> {
		dispatch_await!(self, unbonding_period)
	}

	async fn query_header(&self, height: Height) -> Result<Header, Error> {
		dispatch_await!(self, query_header, height)
	}

	async fn query_consensus_state(
		&self,
		client_id: &str,
		height: Height,
	) -> Result<ConsensusState, Error> {
		dispatch_await!(self, query_consensus_state, client_id, height)
	}

	async fn query_client_state(&self, client_id: &str) -> Result<ClientState, Error> {
		dispatch_await!(self, query_client_state, client_id)
	}

	async fn query_raw_proof(
		&self,
		store_name: &str,
		key: &[u8],
		proof_height: Height,
	) -> Result<RawProof, Error> {
		dispatch_await!(self, query_raw_proof, store_name, key, proof_height)
	}

	async fn query_events_by_range(
		&self,
		min_height: Height,
		max_height: Option<Height>,
	) -> Result<Vec<IbcEvent>, Error> {
		dispatch_await!(self, query_events_by_range, min_height, max_height)
	}

	async fn submit_ibc_msgs(&self, msgs: Vec<IbcMessage>) -> Result<TxResult, Error> {
		dispatch_await!(self, submit_ibc_msgs, msgs)
	}

	async fn build_consensus_state(&self, header: &Header) -> Result<ConsensusState, Error> {
		dispatch_await!(self, build_consensus_state, header)
	}

	async fn build_client_state(
		&self,
		latest_header: &Header,
		unbonding_period: Duration,
		trusting_period: Duration,
	) -> Result<ClientState, Error> {
		dispatch_await!(self, build_client_state, latest_header, unbonding_period, trusting_period)
	}

	async fn build_header_update(
		&self,
		trusted_height: Height,
		target_height: Height,
	) -> Result<Header, Error> {
		dispatch_await!(self, build_header_update, trusted_height, target_height)
	}

	async fn register_counterparty(
		&self,
		local_client_id: &str,
		remote_client_id: &str,
		merkle_prefix: &[u8],
	) -> Result<(), Error> {
		dispatch_await!(self, register_counterparty, local_client_id, remote_client_id, merkle_prefix)
	}

	async fn query_connection(&self, connection_id: &str) -> Result<Connection, Error> {
		dispatch_await!(self, query_connection, connection_id)
	}

	async fn query_channel(&self, port_id: &str, channel_id: &str) -> Result<Channel, Error> {
		dispatch_await!(self, query_channel, port_id, channel_id)
	}

	async fn query_counterparty(&self, client_id: &str) -> Result<CounterpartyRegistration, Error> {
		dispatch_await!(self, query_counterparty, client_id)
	}

	fn ibc_version_supported(&self, version: u8) -> bool {
		dispatch!(self, ibc_version_supported, version)
	}
}
