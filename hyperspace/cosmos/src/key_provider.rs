//! Mnemonic-derived secp256k1 signer and bech32 account id, mirroring the
//! teacher's `KeyEntry`/`KeyProvider` pairing (`examples/other_examples/60f85514_...`).

use crate::error::CosmosError;
use bip32::{DerivationPath, XPrv};
use k256::ecdsa::signature::Signer;
use k256::ecdsa::{Signature, SigningKey};
use primitives::key_provider::KeyProvider;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use std::str::FromStr;

/// `m/44'/118'/0'/0/0`: the Cosmos SDK's default HD path.
const COSMOS_HD_PATH: &str = "m/44'/118'/0'/0/0";

#[derive(Clone)]
pub struct CosmosKeyEntry {
	signing_key: SigningKey,
	account_prefix: String,
}

impl CosmosKeyEntry {
	pub fn from_mnemonic(mnemonic: &str, account_prefix: &str) -> Result<Self, CosmosError> {
		let mnemonic = bip39::Mnemonic::from_phrase(mnemonic, bip39::Language::English)
			.map_err(|e| CosmosError::Mnemonic(e.to_string()))?;
		let seed = bip39::Seed::new(&mnemonic, "");
		let path = DerivationPath::from_str(COSMOS_HD_PATH)
			.map_err(|e| CosmosError::Other(format!("invalid derivation path: {e}")))?;
		let xprv = XPrv::derive_from_path(seed.as_bytes(), &path)?;
		let signing_key = SigningKey::from(xprv.private_key());
		Ok(Self { signing_key, account_prefix: account_prefix.to_string() })
	}

	pub fn compressed_public_key(&self) -> Vec<u8> {
		self.signing_key.verifying_key().to_encoded_point(true).as_bytes().to_vec()
	}
}

impl KeyProvider for CosmosKeyEntry {
	fn account_id(&self) -> String {
		let pubkey = self.compressed_public_key();
		let sha = Sha256::digest(&pubkey);
		let ripemd = Ripemd160::digest(sha);
		let data = bech32::convert_bits(&ripemd, 8, 5, true).expect("8->5 bit conversion cannot fail");
		bech32::encode(&self.account_prefix, data, bech32::Variant::Bech32)
			.expect("prefix and payload are always valid bech32 input")
	}

	fn public_key(&self) -> Vec<u8> {
		self.compressed_public_key()
	}

	fn sign(&self, msg: &[u8]) -> Vec<u8> {
		let signature: Signature = self.signing_key.sign(msg);
		signature.to_bytes().to_vec()
	}
}
