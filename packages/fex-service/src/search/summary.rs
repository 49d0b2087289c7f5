//! Conversational summary shown above the result list.

use serde_json::Value;

use crate::{
	FexService,
	search::{SearchResult, Tier},
};

const TOP_NAMES: usize = 3;
const PROMPT_RESULTS: usize = 5;

/// Deterministic summary used whenever the model is not consulted.
pub(super) fn template(query: &str, results: &[SearchResult], tier: Tier) -> String {
	if tier == Tier::Exhausted {
		return "Search is temporarily unavailable. Please try again later.".to_string();
	}
	if tier == Tier::Quaternary && results.is_empty() {
		return "Search services are unavailable and nothing in the static sample matched. \
The sample is served without AI assistance."
			.to_string();
	}
	if results.is_empty() {
		return "No companies matched; try broader terms.".to_string();
	}

	let names: Vec<&str> =
		results.iter().take(TOP_NAMES).map(|result| result.company.display_name()).collect();
	let count = results.len();
	let noun = if count == 1 { "company" } else { "companies" };

	if tier == Tier::Quaternary {
		return format!(
			"Search services are unavailable, so these {count} {noun} come from a static sample \
without AI assistance: {}.",
			names.join(", ")
		);
	}

	format!("Found {count} {noun} matching \"{query}\". Top matches: {}.", names.join(", "))
}

fn build_summary_messages(query: &str, results: &[SearchResult]) -> Vec<Value> {
	let listing: Vec<String> = results
		.iter()
		.take(PROMPT_RESULTS)
		.map(|result| {
			let company = &result.company;

			format!(
				"- {} | {} | {} employees | {}",
				company.display_name(),
				company.province.as_deref().unwrap_or("unknown province"),
				company
					.insured_employees
					.map(|count| count.to_string())
					.unwrap_or_else(|| "unknown".to_string()),
				company.main_products.as_deref().unwrap_or("unknown products"),
			)
		})
		.collect();
	let system_prompt = "You help importers discover Chinese trade-fair exhibitors. \
Write two or three plain sentences summarizing the companies found for the buyer's query. \
Mention only companies from the list. Reply in the language of the query. No markdown.";
	let user_prompt = format!(
		"Query:\n{query}\nCompanies found ({total}):\n{listing}",
		total = results.len(),
		listing = listing.join("\n"),
	);

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

impl FexService {
	/// Returns the summary and whether the model wrote it.
	pub(super) async fn summarize(
		&self,
		query: &str,
		results: &[SearchResult],
		tier: Tier,
	) -> (String, bool) {
		if !self.cfg.search.summary.enabled || results.is_empty() || !self.breakers.llm.allow() {
			return (template(query, results, tier), false);
		}

		let messages = build_summary_messages(query, results);
		let generated = self
			.providers
			.generation
			.generate(&self.cfg.providers.llm_extractor, &messages)
			.await;

		self.breakers.llm.observe(&generated);

		match generated {
			Ok(text) if !text.trim().is_empty() => (text.trim().to_string(), true),
			Ok(_) => (template(query, results, tier), false),
			Err(err) => {
				tracing::warn!(error = %err, "Summary generation failed. Using the template.");

				(template(query, results, tier), false)
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use fex_domain::Company;

	use super::*;
	use crate::search::MatchType;

	fn result(name: &str) -> SearchResult {
		SearchResult {
			company: Company { name_en: Some(name.to_string()), ..Default::default() },
			company_age: None,
			relevance_score: 40,
			matched_fields: Vec::new(),
			explanation: String::new(),
			match_type: MatchType::Exact,
		}
	}

	#[test]
	fn template_names_the_top_matches() {
		let results = vec![result("Alpha"), result("Beta"), result("Gamma"), result("Delta")];

		assert_eq!(
			template("LED", &results, Tier::Primary),
			"Found 4 companies matching \"LED\". Top matches: Alpha, Beta, Gamma."
		);
		assert_eq!(
			template("LED", &results[..1], Tier::Secondary),
			"Found 1 company matching \"LED\". Top matches: Alpha."
		);
	}

	#[test]
	fn template_covers_degraded_responses() {
		assert_eq!(template("x", &[], Tier::Tertiary), "No companies matched; try broader terms.");
		assert!(template("x", &[result("Alpha")], Tier::Quaternary).contains("static sample"));
		assert!(template("x", &[], Tier::Exhausted).contains("unavailable"));
	}

	#[test]
	fn empty_sample_still_reports_the_degraded_mode() {
		let summary = template("x", &[], Tier::Quaternary);

		assert!(summary.contains("static sample"));
		assert!(summary.contains("without AI assistance"));
	}
}
