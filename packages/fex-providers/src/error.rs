pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
impl Error {
	/// Timeouts, connection failures, rate limits and upstream 5xx responses. Worth one more try.
	pub fn is_transient(&self) -> bool {
		match self {
			Self::Reqwest(err) => {
				if err.is_timeout() || err.is_connect() {
					return true;
				}

				err.status().is_some_and(|status| {
					status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
				})
			},
			_ => false,
		}
	}

	pub(crate) fn invalid_response(message: impl Into<String>) -> Self {
		Self::InvalidResponse { message: message.into() }
	}
}
