use serde_json::Value;

use crate::{Error, Result, chat};

/// Asks the generation capability for one 0-100 relevance score per document.
///
/// The returned vector may be shorter than `docs` when the model stops early; scores are aligned
/// by position.
pub async fn rerank(
	cfg: &fex_config::LlmProviderConfig,
	query: &str,
	docs: &[String],
) -> Result<Vec<f32>> {
	let messages = build_rerank_messages(query, docs);
	let json = chat::complete_json(cfg, &messages).await?;

	parse_rerank_scores(&json, docs.len())
}

fn build_rerank_messages(query: &str, docs: &[String]) -> Vec<Value> {
	let system_prompt = "You rate how well trade-fair exhibitor companies match a buyer's search. \
Output must be valid JSON only, shaped as {\"scores\": [number, ...]}. \
Return exactly one integer from 1 to 100 per numbered company, in the same order. \
Do not add explanations or extra fields.";
	let listing = docs
		.iter()
		.enumerate()
		.map(|(i, doc)| format!("{}. {doc}", i + 1))
		.collect::<Vec<_>>()
		.join("\n");
	let user_prompt = format!("Search query:\n{query}\nCompanies:\n{listing}");

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

fn parse_rerank_scores(json: &Value, doc_count: usize) -> Result<Vec<f32>> {
	let scores = json
		.get("scores")
		.and_then(|v| v.as_array())
		.ok_or_else(|| Error::invalid_response("Rerank response is missing scores array."))?;

	scores
		.iter()
		.take(doc_count)
		.map(|value| {
			let number = value
				.as_f64()
				.or_else(|| value.as_str().and_then(|raw| raw.trim().parse().ok()))
				.filter(|number| number.is_finite())
				.ok_or_else(|| Error::invalid_response("Rerank score must be numeric."))?;

			Ok(number.clamp(0.0, 100.0) as f32)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scores_are_clamped_and_truncated() {
		let json = serde_json::json!({ "scores": [95, "40", 140, -3, 10] });
		let scores = parse_rerank_scores(&json, 4).expect("parse failed");

		assert_eq!(scores, vec![95.0, 40.0, 100.0, 0.0]);
	}

	#[test]
	fn rejects_non_numeric_scores() {
		let json = serde_json::json!({ "scores": ["high"] });

		assert!(parse_rerank_scores(&json, 1).is_err());
		assert!(parse_rerank_scores(&serde_json::json!({}), 1).is_err());
	}

	#[test]
	fn prompt_numbers_every_document() {
		let messages =
			build_rerank_messages("LED", &["A - LED (Guangdong)".to_string(), "B".to_string()]);
		let user = messages[1]["content"].as_str().expect("content missing");

		assert!(user.contains("1. A - LED (Guangdong)"));
		assert!(user.contains("2. B"));
	}
}
