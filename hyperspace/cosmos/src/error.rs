use primitives::error::Error as RelayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CosmosError {
	#[error("tendermint rpc error: {0}")]
	Rpc(#[from] tendermint_rpc::Error),
	#[error("grpc transport error: {0}")]
	Transport(#[from] tonic::transport::Error),
	#[error("grpc call failed: {0}")]
	Grpc(#[from] tonic::Status),
	#[error("protobuf decode error: {0}")]
	Decode(#[from] prost::DecodeError),
	#[error("invalid bech32 address: {0}")]
	Bech32(#[from] bech32::Error),
	#[error("invalid key derivation: {0}")]
	Bip32(#[from] bip32::Error),
	#[error("invalid mnemonic: {0}")]
	Mnemonic(String),
	#[error("abci query for {path} failed with code {code:?}: {log}")]
	AbciQuery { path: String, code: u32, log: String },
	#[error("{0}")]
	Other(String),
}

impl From<CosmosError> for RelayError {
	fn from(err: CosmosError) -> Self {
		match err {
			CosmosError::Rpc(e) => RelayError::Transient { chain_id: String::new(), reason: e.to_string() },
			CosmosError::Transport(e) => RelayError::Transient { chain_id: String::new(), reason: e.to_string() },
			other => RelayError::ProtocolViolation(other.to_string()),
		}
	}
}
