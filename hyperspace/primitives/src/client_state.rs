use crate::chain_id::ChainId;
use crate::height::Height;
use std::time::Duration;

/// Chain-metadata and trust parameters for verifying updates (spec §4.C step 3).
#[derive(Debug, Clone)]
pub struct ClientState {
	pub chain_id: ChainId,
	/// Numerator/denominator, e.g. 1/3.
	pub trust_level: (u64, u64),
	pub unbonding_period: Duration,
	pub trusting_period: Duration,
	pub max_clock_drift: Duration,
	pub latest_height: Height,
	pub proof_specs: Vec<ProofSpec>,
	pub upgrade_path: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofSpec {
	Iavl,
	Tendermint,
}

/// `{timestamp, root, nextValidatorsHash}` at a specific height of the tracked chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusState {
	/// Unix nanoseconds.
	pub timestamp: u64,
	pub root: Vec<u8>,
	pub next_validators_hash: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ValidatorSet {
	pub hash: Vec<u8>,
}

/// A light-client update: a signed header plus the validator sets needed to verify it
/// against the client's trusted height.
#[derive(Debug, Clone)]
pub struct Header {
	pub signed_header_height: Height,
	pub validator_set: ValidatorSet,
	pub trusted_height: Height,
	pub trusted_validators: ValidatorSet,
	pub timestamp: u64,
	pub app_hash: Vec<u8>,
	pub next_validators_hash: Vec<u8>,
}

/// Whether a client update is load-bearing for a pending submission (`Mandatory`, must
/// happen before the submission can proceed) or opportunistic freshness maintenance
/// (`Optional`, e.g. a stale-client heartbeat).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateType {
	Mandatory,
	Optional,
}

/// `{value, height, proof}` returned by a raw proof query; `proof` is a two-op ICS-23
/// chain (leaf store + meta store).
#[derive(Debug, Clone)]
pub struct RawProof {
	pub value: Option<Vec<u8>>,
	pub height: Height,
	pub proof: MerkleProof,
}

#[derive(Debug, Clone)]
pub struct MerkleProof {
	pub proofs: Vec<CommitmentProof>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitmentProofOp {
	Leaf,
	Meta,
}

#[derive(Debug, Clone)]
pub struct CommitmentProof {
	pub op_type: CommitmentProofOp,
	/// The key this proof op claims to cover; must echo the queried key.
	pub key: Vec<u8>,
}

impl MerkleProof {
	/// `checkAndParseOp`: validates the ops' types and that the inner key echoes the
	/// queried key. A mismatch is fatal (`ErrProofMalformed`).
	pub fn check_and_parse(&self, expected_key: &[u8]) -> Result<(), crate::error::Error> {
		if self.proofs.len() != 2 {
			return Err(crate::error::Error::ProofMalformed(format!(
				"expected 2 proof ops, got {}",
				self.proofs.len()
			)));
		}
		let leaf_ok = self.proofs[0].op_type == CommitmentProofOp::Leaf;
		let meta_ok = self.proofs[1].op_type == CommitmentProofOp::Meta;
		let key_ok = self.proofs[0].key == expected_key;
		if !leaf_ok || !meta_ok || !key_ok {
			return Err(crate::error::Error::ProofMalformed(
				"proof op types or embedded key do not match the query".into(),
			));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn proof(key: &[u8]) -> MerkleProof {
		MerkleProof {
			proofs: vec![
				CommitmentProof { op_type: CommitmentProofOp::Leaf, key: key.to_vec() },
				CommitmentProof { op_type: CommitmentProofOp::Meta, key: b"meta".to_vec() },
			],
		}
	}

	#[test]
	fn accepts_matching_proof() {
		assert!(proof(b"key").check_and_parse(b"key").is_ok());
	}

	#[test]
	fn rejects_key_mismatch() {
		assert!(proof(b"key").check_and_parse(b"other").is_err());
	}

	#[test]
	fn rejects_wrong_op_count() {
		let p = MerkleProof {
			proofs: vec![CommitmentProof { op_type: CommitmentProofOp::Leaf, key: b"key".to_vec() }],
		};
		assert!(p.check_and_parse(b"key").is_err());
	}
}
