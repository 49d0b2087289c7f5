//! Chat-completions client for the text-generation capability.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Requests a JSON object response and parses the first choice's content.
pub async fn complete_json(cfg: &fex_config::LlmProviderConfig, messages: &[Value]) -> Result<Value> {
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"response_format": { "type": "json_object" },
		"messages": messages,
	});
	let json = send(cfg, &body).await?;

	parse_json_content(&json)
}

/// Requests free text and returns the first choice's content, trimmed.
pub async fn complete_text(cfg: &fex_config::LlmProviderConfig, messages: &[Value]) -> Result<String> {
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});
	let json = send(cfg, &body).await?;

	first_content(&json).map(|content| content.trim().to_string())
}

async fn send(cfg: &fex_config::LlmProviderConfig, body: &Value) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;

	crate::with_retry(|| async {
		let res = client.post(&url).headers(headers.clone()).json(body).send().await?;

		Ok(res.error_for_status()?.json::<Value>().await?)
	})
	.await
}

fn first_content(json: &Value) -> Result<&str> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|choices| choices.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|message| message.get("content"))
		.and_then(|content| content.as_str())
		.ok_or_else(|| Error::invalid_response("Chat response is missing message content."))
}

fn parse_json_content(json: &Value) -> Result<Value> {
	let content = first_content(json)?;
	let parsed: Value = serde_json::from_str(strip_code_fence(content))
		.map_err(|_| Error::invalid_response("Chat content is not valid JSON."))?;

	if !parsed.is_object() {
		return Err(Error::invalid_response("Chat content must be a JSON object."));
	}

	Ok(parsed)
}

/// Models sometimes wrap JSON in a Markdown fence despite `response_format`.
fn strip_code_fence(content: &str) -> &str {
	let trimmed = content.trim();
	let Some(inner) = trimmed.strip_prefix("```") else {
		return trimmed;
	};
	let inner = inner.strip_prefix("json").unwrap_or(inner);

	inner.strip_suffix("```").unwrap_or(inner).trim()
}
