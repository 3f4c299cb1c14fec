/// Façade over an OS-keyring-backed signer. Chain clients delegate signing to a
/// `KeyProvider` rather than holding raw key material themselves.
pub trait KeyProvider {
	fn account_id(&self) -> String;
	fn public_key(&self) -> Vec<u8>;
	fn sign(&self, msg: &[u8]) -> Vec<u8>;
}
