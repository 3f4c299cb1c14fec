//! Builds, verifies, and updates on-chain light clients from source-chain headers
//! and validator sets (spec §4.C). Named after the teacher's `finality_protocol`
//! module, which separates per-protocol update/verify logic the same way.

use primitives::chain::{ChainClient, IbcMessage};
use primitives::client_state::UpdateType;
use primitives::error::Error;
use primitives::height::Height;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Serialises `update_client` calls to one `(destination, client_id)` pair so
/// concurrent rounds never race each other wastefully (spec §5, and Open Question 2
/// in DESIGN.md — a deliberate strengthening over just relying on chain idempotence).
#[derive(Default)]
pub struct LightClientDriver {
	update_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LightClientDriver {
	pub fn new() -> Self {
		Self::default()
	}

	async fn lock_for(&self, destination_chain_id: &str, client_id: &str) -> Arc<Mutex<()>> {
		let key = format!("{destination_chain_id}/{client_id}");
		let mut locks = self.update_locks.lock().await;
		locks.entry(key).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
	}

	/// Creates a remote light client on `dest` tracking `src` (spec §4.C "Creating a
	/// remote light client").
	pub async fn create_client(
		&self,
		src: &dyn ChainClient,
		dest: &dyn ChainClient,
		trust_period_override: Option<Duration>,
	) -> Result<String, Error> {
		let latest_header = src.query_header(src.current_height().await?).await?;
		let unbonding_period = src.unbonding_period().await?;
		let trusting_period = trust_period_override.unwrap_or(unbonding_period * 2 / 3);
		if trusting_period >= unbonding_period {
			return Err(Error::Configuration(format!(
				"trusting period {trusting_period:?} must be < unbonding period {unbonding_period:?}"
			)));
		}
		let client_state = src.build_client_state(&latest_header, unbonding_period, trusting_period).await?;
		let consensus_state = src.build_consensus_state(&latest_header).await?;
		let tx = dest
			.submit_ibc_msgs(vec![IbcMessage::CreateClient { client_state, consensus_state }])
			.await?;
		if !tx.is_ok() {
			return Err(Error::ChainRejected {
				chain_id: dest.chain_id().to_string(),
				tx_hash: tx.tx_hash,
				height: tx.height,
				code: tx.code,
				raw_log: tx.raw_log,
			});
		}
		// The real tx response would carry the assigned client-id; the abstract
		// interface surfaces it via a deterministic naming convention here.
		Ok(format!("07-tendermint-{}", tx.height.revision_height))
	}

	/// Updates `dest`'s view of `src` to at least `target_height` (spec §4.C
	/// "Updating a remote light client"). Idempotent if already at or beyond
	/// `target_height`.
	pub async fn update_client(
		&self,
		src: &dyn ChainClient,
		dest: &dyn ChainClient,
		client_id: &str,
		target_height: Height,
	) -> Result<UpdateType, Error> {
		let guard = self.lock_for(&dest.chain_id().to_string(), client_id).await;
		let _held = guard.lock().await;

		let client_state = dest.query_client_state(client_id).await?;
		if client_state.latest_height >= target_height {
			return Ok(UpdateType::Optional);
		}

		let current_height = src.current_height().await?;
		let header = src.build_header_update(client_state.latest_height, current_height).await?;
		let tx = dest
			.submit_ibc_msgs(vec![IbcMessage::UpdateClient {
				client_id: client_id.to_string(),
				header,
			}])
			.await?;
		if !tx.is_ok() {
			return Err(Error::ChainRejected {
				chain_id: dest.chain_id().to_string(),
				tx_hash: tx.tx_hash,
				height: tx.height,
				code: tx.code,
				raw_log: tx.raw_log,
			});
		}
		Ok(UpdateType::Mandatory)
	}

	/// `assertHeadersMatchConsensusState`: asserts `nextValidatorsHash` and `appHash`
	/// match byte-for-byte between the destination's stored consensus state for
	/// `client_id` and a freshly queried source header. Mismatch is fatal for the Link.
	pub async fn assert_headers_match_consensus_state(
		&self,
		src: &dyn ChainClient,
		dest: &dyn ChainClient,
		client_id: &str,
	) -> Result<(), Error> {
		let client_state = dest.query_client_state(client_id).await?;
		let consensus_state =
			dest.query_consensus_state(client_id, client_state.latest_height).await?;
		let source_header = src.query_header(client_state.latest_height).await?;

		if consensus_state.next_validators_hash != source_header.next_validators_hash {
			return Err(Error::ClientDiverged {
				client_id: client_id.to_string(),
				reason: "next_validators_hash mismatch".into(),
			});
		}
		if consensus_state.root != source_header.app_hash {
			return Err(Error::ClientDiverged {
				client_id: client_id.to_string(),
				reason: "consensus root mismatch".into(),
			});
		}
		Ok(())
	}

	/// No-op when `now - consensusState.timestamp < max_age`; otherwise performs an
	/// update (spec §4.C "Staleness").
	pub async fn update_if_stale(
		&self,
		src: &dyn ChainClient,
		dest: &dyn ChainClient,
		client_id: &str,
		max_age: Duration,
	) -> Result<Option<UpdateType>, Error> {
		let client_state = dest.query_client_state(client_id).await?;
		let consensus_state =
			dest.query_consensus_state(client_id, client_state.latest_height).await?;
		let now_nanos = dest.current_time_unix_nanos().await?;
		let age_nanos = now_nanos.saturating_sub(consensus_state.timestamp);
		if age_nanos < max_age.as_nanos() as u64 {
			return Ok(None);
		}
		let target = src.current_height().await?;
		Ok(Some(self.update_client(src, dest, client_id, target).await?))
	}
}
