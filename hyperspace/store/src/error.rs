use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migration(#[from] sqlx::migrate::MigrateError),
	#[error("record validation failed: {0}")]
	Invalid(String),
}

impl From<StoreError> for primitives::error::Error {
	fn from(err: StoreError) -> Self {
		primitives::error::Error::Store(err.to_string())
	}
}
