use crate::height::Height;
use thiserror::Error;

/// Error taxonomy shared across the workspace. Every crate-local error type converts
/// into one of these kinds so the Link/Scheduler can apply a uniform retry policy.
#[derive(Debug, Error)]
pub enum Error {
	/// RPC timeout, connection reset, indexer lag. Retried with backoff by the caller.
	#[error("transient error on chain {chain_id}: {reason}")]
	Transient { chain_id: String, reason: String },

	/// Missing gas price, malformed mnemonic, unknown chain type. Never retried.
	#[error("configuration error: {0}")]
	Configuration(String),

	/// Connection not OPEN, client chain-id mismatch, consensus root mismatch, malformed
	/// proof. Never auto-repaired.
	#[error("protocol violation: {0}")]
	ProtocolViolation(String),

	/// Non-zero deliver-tx code. Never retried; the tx would deterministically re-fail.
	#[error("chain {chain_id} rejected tx {tx_hash} at height {height}: code {code}: {raw_log}")]
	ChainRejected { chain_id: String, tx_hash: String, height: Height, code: u32, raw_log: String },

	/// An operation unsupported by this chain variant (e.g. a v1 op on Gno).
	#[error("unsupported operation on chain {chain_id}: {operation}")]
	Unsupported { chain_id: String, operation: String },

	/// Missing record or schema validation failure in the Store.
	#[error("store error: {0}")]
	Store(String),

	#[error("client {client_id} diverged: {reason}")]
	ClientDiverged { client_id: String, reason: String },

	#[error("chain {chain_id} stalled: no new height after {waited_secs}s")]
	Stalled { chain_id: String, waited_secs: u64 },

	#[error("proof malformed: {0}")]
	ProofMalformed(String),

	#[error("revision mismatch: height {height} does not belong to chain {chain_id}")]
	RevisionMismatch { chain_id: String, height: Height },
}

impl Error {
	/// Transient errors are retried with capped exponential backoff; everything else
	/// surfaces immediately (spec §5, §7).
	pub fn is_transient(&self) -> bool {
		matches!(self, Error::Transient { .. })
	}
}
