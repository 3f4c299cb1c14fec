//! Same mnemonic-derived secp256k1 signer shape as `hyperspace-cosmos::key_provider`;
//! Gno accounts are bech32-encoded the same way Cosmos SDK chains are.

use crate::error::GnoError;
use bip32::{DerivationPath, XPrv};
use k256::ecdsa::signature::Signer;
use k256::ecdsa::{Signature, SigningKey};
use primitives::key_provider::KeyProvider;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use std::str::FromStr;

const GNO_HD_PATH: &str = "m/44'/118'/0'/0/0";

#[derive(Clone)]
pub struct GnoKeyEntry {
	signing_key: SigningKey,
	account_prefix: String,
}

impl GnoKeyEntry {
	pub fn from_mnemonic(mnemonic: &str, account_prefix: &str) -> Result<Self, GnoError> {
		let mnemonic = bip39::Mnemonic::from_phrase(mnemonic, bip39::Language::English)
			.map_err(|e| GnoError::Other(format!("invalid mnemonic: {e}")))?;
		let seed = bip39::Seed::new(&mnemonic, "");
		let path = DerivationPath::from_str(GNO_HD_PATH)
			.map_err(|e| GnoError::Other(format!("invalid derivation path: {e}")))?;
		let xprv = XPrv::derive_from_path(seed.as_bytes(), &path)
			.map_err(|e| GnoError::Other(format!("key derivation failed: {e}")))?;
		let signing_key = SigningKey::from(xprv.private_key());
		Ok(Self { signing_key, account_prefix: account_prefix.to_string() })
	}

	pub fn compressed_public_key(&self) -> Vec<u8> {
		self.signing_key.verifying_key().to_encoded_point(true).as_bytes().to_vec()
	}
}

impl KeyProvider for GnoKeyEntry {
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
