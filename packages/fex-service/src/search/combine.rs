//! Merging strategy outputs into one ranked list, plus the optional AI rerank pass.

use ahash::AHashMap;

use fex_domain::{
	Company, SearchCriteria,
	scoring::{self, MAX_SCORE, Relevance},
};

use crate::{
	FexService,
	search::{MatchType, SearchResult},
};

struct Entry {
	company: Company,
	explanation: Option<String>,
	match_type: MatchType,
	from_exact: bool,
}

/// Stable company identity: registration code, then English name, then Chinese name, then id.
pub(super) fn identity_key(company: &Company) -> String {
	let pick = |value: Option<&str>| {
		value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_lowercase)
	};

	if let Some(code) = pick(company.registration_code.as_deref()) {
		return format!("reg:{code}");
	}
	if let Some(name) = pick(company.name_en.as_deref()) {
		return format!("en:{name}");
	}
	if let Some(name) = pick(company.name_cn.as_deref()) {
		return format!("cn:{name}");
	}

	format!("id:{}", company.id)
}

/// Dedupes by identity and scores every survivor with the shared scorer.
///
/// Sources are visited exact, semantic, fuzzy. The first source to see a company keeps its
/// explanation and match type. Exact membership adds `exact_bonus`, capped at the maximum score.
pub(super) fn merge(
	exact: Vec<Company>,
	semantic: Vec<(Company, f32)>,
	fuzzy: Vec<(Company, Relevance)>,
	criteria: &SearchCriteria,
	current_year: i32,
	exact_bonus: u8,
) -> Vec<SearchResult> {
	let mut index: AHashMap<String, usize> = AHashMap::new();
	let mut entries: Vec<Entry> = Vec::new();
	let mut push = |company: Company, explanation: Option<String>, match_type: MatchType| {
		let key = identity_key(&company);

		match index.get(&key) {
			Some(&at) => entries[at].from_exact |= match_type == MatchType::Exact,
			None => {
				index.insert(key, entries.len());
				entries.push(Entry {
					company,
					explanation,
					match_type,
					from_exact: match_type == MatchType::Exact,
				});
			},
		}
	};

	for company in exact {
		push(company, None, MatchType::Exact);
	}
	for (company, similarity) in semantic {
		push(company, Some(format!("Semantic similarity {similarity:.2}")), MatchType::Semantic);
	}
	for (company, relevance) in fuzzy {
		push(company, Some(format!("Fuzzy match: {}", relevance.explanation)), MatchType::Fuzzy);
	}

	let mut results: Vec<SearchResult> = entries
		.into_iter()
		.map(|entry| {
			let relevance = scoring::score(&entry.company, criteria, current_year);
			let bonus = if entry.from_exact { u32::from(exact_bonus) } else { 0 };
			let score = (u32::from(relevance.score) + bonus).min(u32::from(MAX_SCORE)) as u8;
			let explanation = match entry.explanation {
				Some(lead) => format!("{lead}; {}", relevance.explanation),
				None => relevance.explanation,
			};

			SearchResult {
				company_age: entry.company.age(current_year),
				company: entry.company,
				relevance_score: score,
				matched_fields: relevance.matched_fields,
				explanation,
				match_type: entry.match_type,
			}
		})
		.collect();

	results.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));

	results
}

/// Scores static sample companies with the same model as live results.
pub(super) fn from_sample(
	companies: Vec<Company>,
	criteria: &SearchCriteria,
	current_year: i32,
) -> Vec<SearchResult> {
	let mut results: Vec<SearchResult> = companies
		.into_iter()
		.map(|company| {
			let relevance = scoring::score(&company, criteria, current_year);

			SearchResult {
				company_age: company.age(current_year),
				company,
				relevance_score: relevance.score,
				matched_fields: relevance.matched_fields,
				explanation: format!("Static sample; {}", relevance.explanation),
				match_type: MatchType::Sample,
			}
		})
		.collect();

	results.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));

	results
}

/// Compact one-line description handed to the reranker.
pub(super) fn rerank_doc(company: &Company) -> String {
	let products = company.main_products.as_deref().unwrap_or("unknown products");
	let province = company.province.as_deref().unwrap_or("unknown province");

	format!("{} - {products} ({province})", company.display_name())
}

/// Blends AI scores into the head of the list. A result never loses points to the AI score.
pub(super) fn apply_rerank(results: &mut [SearchResult], scores: &[f32]) {
	for (result, ai) in results.iter_mut().zip(scores) {
		if !ai.is_finite() {
			continue;
		}

		let ai = ai.round().clamp(0.0, f32::from(MAX_SCORE)) as u8;

		result.relevance_score = result.relevance_score.max(ai);
		result.explanation = format!("{}; AI relevance {ai}", result.explanation);
	}

	results.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
}

impl FexService {
	/// Reranks the top candidates in place. Returns whether AI scores were applied.
	pub(super) async fn rerank(&self, query: &str, results: &mut [SearchResult]) -> bool {
		let cfg = &self.cfg.search.combine;

		if !cfg.rerank_enabled
			|| results.len() <= cfg.rerank_min_candidates as usize
			|| !self.breakers.llm.allow()
		{
			return false;
		}

		let top = results.len().min(cfg.rerank_top_k as usize);
		let docs: Vec<String> = results[..top].iter().map(|result| rerank_doc(&result.company)).collect();
		let scores = self.providers.rerank.rerank(&self.cfg.providers.rerank, query, &docs).await;

		self.breakers.llm.observe(&scores);

		match scores {
			Ok(scores) if !scores.is_empty() => {
				apply_rerank(&mut results[..top], &scores);

				true
			},
			Ok(_) => false,
			Err(err) => {
				tracing::warn!(error = %err, "Rerank failed. Keeping local order.");

				false
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn company(code: Option<&str>, name: &str) -> Company {
		Company {
			id: uuid::Uuid::new_v4(),
			registration_code: code.map(str::to_string),
			name_en: Some(name.to_string()),
			main_products: Some("LED lighting".to_string()),
			..Default::default()
		}
	}

	fn led_criteria() -> SearchCriteria {
		SearchCriteria { products: vec!["LED".to_string()], ..Default::default() }
	}

	#[test]
	fn identity_prefers_registration_code() {
		let a = company(Some("9144"), "Alpha Lighting");
		let b = company(Some("9144"), "Alpha Lighting Co.");
		let c = company(None, "alpha lighting");
		let d = company(None, "Alpha Lighting");

		assert_eq!(identity_key(&a), identity_key(&b));
		assert_ne!(identity_key(&a), identity_key(&c));
		assert_eq!(identity_key(&c), identity_key(&d));
	}

	#[test]
	fn unnamed_companies_never_collapse() {
		let a = Company { id: uuid::Uuid::new_v4(), ..Default::default() };
		let b = Company { id: uuid::Uuid::new_v4(), ..Default::default() };

		assert_ne!(identity_key(&a), identity_key(&b));
	}

	#[test]
	fn duplicates_across_strategies_merge_once_with_bonus() {
		let shared = company(Some("9144"), "Alpha Lighting");
		let other = company(Some("9133"), "Beta Lighting");
		let fuzzy_relevance = Relevance { score: 50, ..Default::default() };
		let results = merge(
			vec![shared.clone()],
			vec![(shared.clone(), 0.91), (other.clone(), 0.8)],
			vec![(shared, fuzzy_relevance)],
			&led_criteria(),
			2025,
			20,
		);

		assert_eq!(results.len(), 2);
		assert_eq!(results[0].company.registration_code.as_deref(), Some("9144"));
		assert_eq!(results[0].match_type, MatchType::Exact);
		assert_eq!(results[0].relevance_score, results[1].relevance_score + 20);
		assert!(results[1].explanation.starts_with("Semantic similarity 0.80"));
	}

	#[test]
	fn bonus_is_capped() {
		let mut strong = company(Some("1"), "LED Lighting Works");

		strong.keywords = Some("LED".to_string());
		strong.province = Some("Guangdong".to_string());
		strong.insured_employees = Some(900);
		strong.establishment_year = Some(1990);

		let criteria = SearchCriteria {
			location: Some("Guangdong".to_string()),
			..led_criteria()
		};
		let results = merge(vec![strong], Vec::new(), Vec::new(), &criteria, 2025, 20);

		assert_eq!(results[0].relevance_score, MAX_SCORE);
	}

	#[test]
	fn rerank_takes_the_maximum() {
		let mut results = merge(
			vec![company(Some("1"), "Alpha Lighting"), company(Some("2"), "Beta Lighting")],
			Vec::new(),
			Vec::new(),
			&led_criteria(),
			2025,
			20,
		);
		let local = results[0].relevance_score;

		apply_rerank(&mut results, &[5.0, 99.4]);

		assert_eq!(results[0].company.registration_code.as_deref(), Some("2"));
		assert_eq!(results[0].relevance_score, 99);
		assert_eq!(results[1].relevance_score, local);
		assert!(results[1].explanation.ends_with("AI relevance 5"));
	}

	#[test]
	fn rerank_doc_is_compact() {
		let mut alpha = company(Some("1"), "Alpha Lighting");

		alpha.province = Some("Guangdong".to_string());

		assert_eq!(rerank_doc(&alpha), "Alpha Lighting - LED lighting (Guangdong)");
	}
}
