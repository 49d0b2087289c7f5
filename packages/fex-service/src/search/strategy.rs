//! The three retrieval strategies and their concurrent fan-out.

use std::{future::Future, time::Duration};

use serde::Deserialize;
use serde_json::Value;

use fex_config::SearchShares;
use fex_domain::{
	Company, SearchCriteria, filter,
	scoring::{self, Relevance},
};

use crate::{Error, FexService, Result, search::MatchType};

/// Per-strategy result counts derived from the request limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct SubLimits {
	pub exact: u32,
	pub semantic: u32,
	pub fuzzy: u32,
}
impl SubLimits {
	/// Each strategy gets `ceil(limit * share / total)`. A zero share disables the strategy.
	pub fn split(limit: u32, shares: SearchShares) -> Self {
		let total = f64::from(shares.exact + shares.semantic + shares.fuzzy);
		let part = |share: f32| {
			if share <= 0.0 || total <= 0.0 {
				return 0;
			}

			// Shares arrive as f32, so 0.6 * 10 lands a hair above 6.
			let exact = f64::from(limit) * f64::from(share) / total - 1e-6;

			(exact.ceil() as u32).max(1)
		};

		Self { exact: part(shares.exact), semantic: part(shares.semantic), fuzzy: part(shares.fuzzy) }
	}
}

#[derive(Debug, Default)]
pub(super) struct StrategyHits {
	pub exact: Vec<Company>,
	pub semantic: Vec<(Company, f32)>,
	pub fuzzy: Vec<(Company, Relevance)>,
	/// The semantic query was widened with generated terms.
	pub expanded: bool,
}
impl StrategyHits {
	pub fn methods(&self) -> Vec<MatchType> {
		[
			(MatchType::Exact, !self.exact.is_empty()),
			(MatchType::Semantic, !self.semantic.is_empty()),
			(MatchType::Fuzzy, !self.fuzzy.is_empty()),
		]
		.into_iter()
		.filter_map(|(method, hit)| hit.then_some(method))
		.collect()
	}
}

#[derive(Debug, Deserialize)]
struct ExpansionOutput {
	#[serde(default)]
	terms: Vec<String>,
}

impl FexService {
	/// Runs exact, semantic and fuzzy retrieval concurrently and waits for all three.
	///
	/// A strategy that misses the deadline contributes nothing. Store errors from exact or
	/// fuzzy fail the tier; semantic errors only empty that strategy.
	pub(super) async fn run_strategies(
		&self,
		query: &str,
		criteria: &SearchCriteria,
		limit: u32,
		current_year: i32,
	) -> Result<StrategyHits> {
		let limits = SubLimits::split(limit, self.cfg.search.shares);
		let deadline = Duration::from_millis(self.cfg.search.strategy_timeout_ms);
		let (exact, semantic, fuzzy) = tokio::join!(
			bounded("exact", deadline, self.exact(criteria, limits.exact, current_year)),
			bounded(
				"semantic",
				deadline,
				self.semantic(query, criteria, limits.semantic, current_year)
			),
			bounded("fuzzy", deadline, self.fuzzy(query, criteria, limits.fuzzy, current_year)),
		);
		let (semantic, expanded) = match semantic {
			Ok(hits) => hits.unwrap_or_default(),
			Err(err) => {
				tracing::warn!(
					error = %err,
					strategy = "semantic",
					"Strategy failed. Treating as empty."
				);

				(Vec::new(), false)
			},
		};

		Ok(StrategyHits {
			exact: exact?.unwrap_or_default(),
			semantic,
			fuzzy: fuzzy?.unwrap_or_default(),
			expanded,
		})
	}

	pub(super) async fn exact(
		&self,
		criteria: &SearchCriteria,
		limit: u32,
		current_year: i32,
	) -> Result<Vec<Company>> {
		if limit == 0 {
			return Ok(Vec::new());
		}

		let predicates = filter::exact(criteria, current_year);

		self.store.find_companies(&predicates, criteria.sorting.as_ref(), limit).await
	}

	/// Broad prefetch scored locally. Only candidates at or above the fuzzy threshold survive.
	pub(super) async fn fuzzy(
		&self,
		query: &str,
		criteria: &SearchCriteria,
		limit: u32,
		current_year: i32,
	) -> Result<Vec<(Company, Relevance)>> {
		if limit == 0 {
			return Ok(Vec::new());
		}

		let fuzzy_cfg = &self.cfg.search.fuzzy;
		let predicates = filter::broad(criteria, query, current_year);
		let fetched = self
			.store
			.find_companies(&predicates, None, limit.saturating_mul(fuzzy_cfg.overfetch))
			.await?;
		let mut scored: Vec<(Company, Relevance)> = fetched
			.into_iter()
			.map(|company| {
				let relevance = scoring::fuzzy_score(&company, criteria, query);

				(company, relevance)
			})
			.filter(|(_, relevance)| relevance.score >= fuzzy_cfg.min_score)
			.collect();

		scored.sort_by(|a, b| b.1.score.cmp(&a.1.score));
		scored.truncate(limit as usize);

		Ok(scored)
	}

	/// Nearest neighbours of the (optionally expanded) query. Returns whether expansion was used.
	pub(super) async fn semantic(
		&self,
		query: &str,
		criteria: &SearchCriteria,
		limit: u32,
		current_year: i32,
	) -> Result<(Vec<(Company, f32)>, bool)> {
		if limit == 0 || !self.breakers.embedding.allow() {
			return Ok((Vec::new(), false));
		}

		let terms = self.expand(query).await;
		let expanded = !terms.is_empty();
		let text = if expanded { format!("{query} {}", terms.join(" ")) } else { query.to_string() };
		let embedded = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, std::slice::from_ref(&text))
			.await;

		self.breakers.embedding.observe(&embedded);

		let Some(vector) = embedded?.into_iter().next() else {
			return Err(Error::Provider { message: "Embedding response was empty.".to_string() });
		};
		let constraints = filter::hard_constraints(criteria, current_year);
		let hits = self
			.store
			.find_similar(
				&vector,
				self.cfg.search.semantic.similarity_threshold,
				&constraints,
				limit,
			)
			.await?;

		Ok((hits, expanded))
	}

	/// Related terms for the semantic query. Any failure yields no terms.
	async fn expand(&self, query: &str) -> Vec<String> {
		let cfg = &self.cfg.search.expansion;

		if !cfg.enabled || cfg.max_terms == 0 || !self.breakers.llm.allow() {
			return Vec::new();
		}

		let messages = build_expansion_messages(query, cfg.max_terms);
		let raw =
			self.providers.extractor.extract(&self.cfg.providers.llm_extractor, &messages).await;

		self.breakers.llm.observe(&raw);

		let raw = match raw {
			Ok(value) => value,
			Err(err) => {
				tracing::warn!(error = %err, "Query expansion failed. Embedding the original query.");

				return Vec::new();
			},
		};

		match serde_json::from_value::<ExpansionOutput>(raw) {
			Ok(parsed) => normalize_terms(parsed.terms, query, cfg.max_terms),
			Err(err) => {
				tracing::warn!(
					error = %err,
					"Query expansion returned invalid JSON. Embedding the original query."
				);

				Vec::new()
			},
		}
	}
}

/// Applies the strategy deadline. `Ok(None)` means the strategy timed out.
async fn bounded<T, F>(name: &'static str, deadline: Duration, fut: F) -> Result<Option<T>>
where
	F: Future<Output = Result<T>>,
{
	match tokio::time::timeout(deadline, fut).await {
		Ok(result) => result.map(Some),
		Err(_) => {
			tracing::warn!(
				strategy = name,
				timeout_ms = deadline.as_millis() as u64,
				"Strategy timed out. Treating as empty."
			);

			Ok(None)
		},
	}
}

fn build_expansion_messages(query: &str, max_terms: u32) -> Vec<Value> {
	let system_prompt = "You expand search queries for a directory of Chinese trade-fair exhibitors. \
Output must be valid JSON only, shaped as {\"terms\": [\"string\"]}. \
Return short product synonyms, category names and related industry terms in English or Chinese. \
Do not repeat the original query. Do not add explanations or extra fields.";
	let user_prompt = format!("MAX_TERMS = {max_terms}\nOriginal query:\n{query}");

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

fn normalize_terms(terms: Vec<String>, query: &str, max_terms: u32) -> Vec<String> {
	let query_key = query.trim().to_lowercase();
	let mut seen: Vec<String> = Vec::new();
	let mut out = Vec::new();

	for term in terms {
		let trimmed = term.trim();
		let key = trimmed.to_lowercase();

		if trimmed.is_empty() || key == query_key || seen.contains(&key) {
			continue;
		}

		seen.push(key);
		out.push(trimmed.to_string());

		if out.len() >= max_terms as usize {
			break;
		}
	}

	out
}
