pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0}")]
	Message(String),
	#[error(transparent)]
	Storage(#[from] fex_storage::Error),
	#[error(transparent)]
	Provider(#[from] fex_providers::Error),
}
