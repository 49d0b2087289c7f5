use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Embeds `texts` in one request. Vectors come back in input order.
pub async fn embed(
	cfg: &fex_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let vectors = crate::with_retry(|| async {
		let res = client.post(&url).headers(headers.clone()).json(&body).send().await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_embedding_response(json)
	})
	.await?;

	if vectors.len() != texts.len() {
		return Err(Error::invalid_response(format!(
			"Embedding response returned {} vectors for {} inputs.",
			vectors.len(),
			texts.len()
		)));
	}
	if let Some(vec) = vectors.iter().find(|vec| vec.len() != cfg.dimensions as usize) {
		return Err(Error::invalid_response(format!(
			"Embedding dimension mismatch. Expected {}, got {}.",
			cfg.dimensions,
			vec.len()
		)));
	}

	Ok(vectors)
}

fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json
		.get("data")
		.and_then(|v| v.as_array())
		.ok_or_else(|| Error::invalid_response("Embedding response is missing data array."))?;
	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (position, item) in data.iter().enumerate() {
		let index =
			item.get("index").and_then(|v| v.as_u64()).map(|v| v as usize).unwrap_or(position);
		let embedding = item
			.get("embedding")
			.and_then(|v| v.as_array())
			.ok_or_else(|| Error::invalid_response("Embedding item missing embedding array."))?;
		let vec = embedding
			.iter()
			.map(|value| {
				value
					.as_f64()
					.map(|number| number as f32)
					.ok_or_else(|| Error::invalid_response("Embedding value must be numeric."))
			})
			.collect::<Result<Vec<_>>>()?;

		indexed.push((index, vec));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}
