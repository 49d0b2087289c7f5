mod combine;
mod extract;
mod strategy;
mod summary;

use std::time::Instant;

use serde::{Deserialize, Serialize};

use fex_domain::{
	Company, SearchCriteria,
	filter,
	heuristic::{self, HeuristicOptions},
};

use crate::{Error, FexService, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	#[serde(default)]
	pub limit: Option<u32>,
}

/// Which path produced a result. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
	Exact,
	Semantic,
	Fuzzy,
	Sample,
}

/// Fallback tier that served a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
	Primary,
	Secondary,
	Tertiary,
	Quaternary,
	Exhausted,
}
impl Tier {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Primary => "primary",
			Self::Secondary => "secondary",
			Self::Tertiary => "tertiary",
			Self::Quaternary => "quaternary",
			Self::Exhausted => "exhausted",
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
	pub company: Company,
	/// Derived at request time from the establishment year.
	pub company_age: Option<i32>,
	pub relevance_score: u8,
	pub matched_fields: Vec<String>,
	pub explanation: String,
	pub match_type: MatchType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
	pub query: String,
	pub total_results: usize,
	pub companies: Vec<SearchResult>,
	pub search_time_ms: u64,
	pub criteria: SearchCriteria,
	pub ai_assisted: bool,
	pub static_sample: bool,
	pub unavailable: bool,
	pub tier: Tier,
	pub search_methods: Vec<MatchType>,
	pub summary: String,
}

/// What one tier hands back to the controller.
struct TierOutcome {
	results: Vec<SearchResult>,
	methods: Vec<MatchType>,
	ai_assisted: bool,
}

struct Finish<'a> {
	query: &'a str,
	criteria: SearchCriteria,
	tier: Tier,
	outcome: TierOutcome,
	summary: String,
	started: Instant,
}

impl FexService {
	/// Runs one search through the fallback chain.
	///
	/// The only error is an invalid request. Every dependency failure is absorbed by demoting to
	/// the next tier, down to the static sample.
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let started = Instant::now();
		let max_chars = self.cfg.service.max_query_chars as usize;

		if req.query.chars().count() > max_chars {
			return Err(Error::InvalidRequest {
				message: format!("query must be at most {max_chars} characters."),
			});
		}

		let query = req.query.trim();
		let opts = HeuristicOptions {
			current_year: fex_domain::current_year(),
			usd_to_cny_rate: self.cfg.search.usd_to_cny_rate,
			max_limit: self.cfg.search.max_limit,
		};

		if query.is_empty() {
			let criteria = heuristic::extract(query, &opts);
			let outcome = TierOutcome { results: Vec::new(), methods: Vec::new(), ai_assisted: false };

			return Ok(self.finish(Finish {
				query,
				criteria,
				tier: Tier::Primary,
				summary: summary::template(query, &[], Tier::Primary),
				outcome,
				started,
			}));
		}

		// Gate once per request. A tier failing inside this request must not skip the later tiers.
		let store_allowed = self.breakers.store.allow();

		if store_allowed {
			let (criteria, llm_criteria) = self.extract_criteria(query, &opts).await;
			let limit = self.resolve_limit(req.limit, &criteria);
			let primary = self.primary(query, &criteria, limit, opts.current_year).await;

			self.breakers.store.observe(&primary);

			match primary {
				Ok(mut outcome) => {
					outcome.ai_assisted |= llm_criteria;

					let (summary, ai_summary) =
						self.summarize(query, &outcome.results, Tier::Primary).await;

					outcome.ai_assisted |= ai_summary;

					return Ok(self.finish(Finish {
						query,
						criteria,
						tier: Tier::Primary,
						outcome,
						summary,
						started,
					}));
				},
				Err(err) => self.demote(Tier::Primary, &err),
			}

			let secondary = self.exact_only(&criteria, limit, opts.current_year).await;

			self.breakers.store.observe(&secondary);

			match secondary {
				Ok(mut outcome) => {
					outcome.ai_assisted = llm_criteria;

					return Ok(self.finish(Finish {
						query,
						summary: summary::template(query, &outcome.results, Tier::Secondary),
						criteria,
						tier: Tier::Secondary,
						outcome,
						started,
					}));
				},
				Err(err) => self.demote(Tier::Secondary, &err),
			}
		}

		let criteria = heuristic::extract(query, &opts);
		let limit = self.resolve_limit(req.limit, &criteria);

		if store_allowed {
			let tertiary = self.exact_only(&criteria, limit, opts.current_year).await;

			self.breakers.store.observe(&tertiary);

			match tertiary {
				Ok(outcome) => {
					return Ok(self.finish(Finish {
						query,
						summary: summary::template(query, &outcome.results, Tier::Tertiary),
						criteria,
						tier: Tier::Tertiary,
						outcome,
						started,
					}));
				},
				Err(err) => self.demote(Tier::Tertiary, &err),
			}
		}

		Ok(self.last_resort(query, criteria, limit, opts.current_year, started))
	}

	fn resolve_limit(&self, requested: Option<u32>, criteria: &SearchCriteria) -> u32 {
		let search = &self.cfg.search;

		requested.or(criteria.limit).unwrap_or(search.default_limit).clamp(1, search.max_limit.max(1))
	}

	/// All three strategies, merged and optionally reranked.
	async fn primary(
		&self,
		query: &str,
		criteria: &SearchCriteria,
		limit: u32,
		current_year: i32,
	) -> Result<TierOutcome> {
		let hits = self.run_strategies(query, criteria, limit, current_year).await?;
		let methods = hits.methods();
		let expanded = hits.expanded;
		let mut results = combine::merge(
			hits.exact,
			hits.semantic,
			hits.fuzzy,
			criteria,
			current_year,
			self.cfg.search.combine.exact_bonus,
		);
		let reranked = self.rerank(query, &mut results).await;

		results.truncate(limit as usize);

		Ok(TierOutcome { results, methods, ai_assisted: expanded || reranked })
	}

	/// Exact strategy alone, no AI passes.
	async fn exact_only(
		&self,
		criteria: &SearchCriteria,
		limit: u32,
		current_year: i32,
	) -> Result<TierOutcome> {
		let exact = self.exact(criteria, limit, current_year).await?;
		let methods = if exact.is_empty() { Vec::new() } else { vec![MatchType::Exact] };
		let mut results = combine::merge(
			exact,
			Vec::new(),
			Vec::new(),
			criteria,
			current_year,
			self.cfg.search.combine.exact_bonus,
		);

		results.truncate(limit as usize);

		Ok(TierOutcome { results, methods, ai_assisted: false })
	}

	/// Serves the static sample, or an empty "unavailable" response when there is none.
	fn last_resort(
		&self,
		query: &str,
		criteria: SearchCriteria,
		limit: u32,
		current_year: i32,
		started: Instant,
	) -> SearchResponse {
		if self.sample.is_empty() {
			tracing::error!(query_chars = query.chars().count(), "Every search tier failed.");

			let outcome = TierOutcome { results: Vec::new(), methods: Vec::new(), ai_assisted: false };

			return self.finish(Finish {
				query,
				criteria,
				tier: Tier::Exhausted,
				outcome,
				summary: summary::template(query, &[], Tier::Exhausted),
				started,
			});
		}

		let constraints = filter::hard_constraints(&criteria, current_year);
		let companies = self.sample.matching(query, &constraints, limit as usize);
		let results = combine::from_sample(companies, &criteria, current_year);
		let methods = if results.is_empty() { Vec::new() } else { vec![MatchType::Sample] };
		let summary = summary::template(query, &results, Tier::Quaternary);

		self.finish(Finish {
			query,
			criteria,
			tier: Tier::Quaternary,
			outcome: TierOutcome { results, methods, ai_assisted: false },
			summary,
			started,
		})
	}

	fn demote(&self, tier: Tier, err: &Error) {
		tracing::warn!(error = %err, tier = tier.as_str(), "Search tier failed. Demoting.");
	}

	fn finish(&self, args: Finish<'_>) -> SearchResponse {
		let Finish { query, criteria, tier, outcome, summary, started } = args;
		let search_time_ms = started.elapsed().as_millis() as u64;

		tracing::info!(
			tier = tier.as_str(),
			results = outcome.results.len(),
			elapsed_ms = search_time_ms,
			"Search completed."
		);

		SearchResponse {
			query: query.to_string(),
			total_results: outcome.results.len(),
			companies: outcome.results,
			search_time_ms,
			criteria,
			ai_assisted: outcome.ai_assisted,
			static_sample: tier == Tier::Quaternary,
			unavailable: tier == Tier::Exhausted,
			tier,
			search_methods: outcome.methods,
			summary,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn wire_names_are_snake_case() {
		let json = serde_json::to_value((Tier::Quaternary, MatchType::Semantic))
			.expect("serialize failed");

		assert_eq!(json, serde_json::json!(["quaternary", "semantic"]));
	}

	#[test]
	fn request_limit_is_optional() {
		let req: SearchRequest =
			serde_json::from_str(r#"{"query":"LED"}"#).expect("deserialize failed");

		assert_eq!(req.limit, None);
	}
}
