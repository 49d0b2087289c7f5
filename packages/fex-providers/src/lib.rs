pub mod chat;
pub mod embedding;
pub mod error;
pub mod rerank;

pub use error::{Error, Result};

use std::{future::Future, time::Duration};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

/// Initial call plus one retry on transient failure.
pub const MAX_ATTEMPTS: u32 = 2;

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

pub(crate) async fn with_retry<T, F, Fut>(mut call: F) -> Result<T>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let mut attempt = 1;

	loop {
		match call().await {
			Ok(value) => return Ok(value),
			Err(err) if attempt < MAX_ATTEMPTS && err.is_transient() => {
				attempt += 1;

				tokio::time::sleep(RETRY_BACKOFF).await;
			},
			Err(err) => return Err(err),
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicU32, Ordering};

	use super::*;

	#[tokio::test]
	async fn permanent_errors_are_not_retried() {
		let calls = AtomicU32::new(0);
		let result: Result<()> = with_retry(|| {
			calls.fetch_add(1, Ordering::SeqCst);

			async { Err(Error::invalid_response("bad payload")) }
		})
		.await;

		assert!(result.is_err());
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}
}
