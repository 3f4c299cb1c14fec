use primitives::error::Error as RelayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GnoError {
	#[error("json-rpc error: {0}")]
	JsonRpc(#[from] jsonrpsee::core::Error),
	#[error("malformed response: {0}")]
	Decode(String),
	#[error("{0}")]
	Other(String),
}

impl From<GnoError> for RelayError {
	fn from(err: GnoError) -> Self {
		match err {
			GnoError::JsonRpc(e) => RelayError::Transient { chain_id: String::new(), reason: e.to_string() },
			other => RelayError::ProtocolViolation(other.to_string()),
		}
	}
}
