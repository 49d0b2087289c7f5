pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Unavailable: {message}")]
	Unavailable { message: String },
}
impl From<fex_storage::Error> for Error {
	fn from(err: fex_storage::Error) -> Self {
		match err {
			fex_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			fex_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			fex_storage::Error::NotFound(message) => Self::Storage { message },
		}
	}
}

impl From<fex_providers::Error> for Error {
	fn from(err: fex_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
