//! Relevance model applied to every candidate, whichever strategy or fallback tier produced it.

use serde::{Deserialize, Serialize};

use crate::{
	company::Company,
	criteria::SearchCriteria,
	filter, lexicon,
};

pub const MAX_SCORE: u8 = 100;
pub const MAX_FUZZY_SCORE: u8 = 90;

const PRODUCT_IN_PRODUCTS: u32 = 20;
const PRODUCT_IN_NAME: u32 = 15;
const PRODUCT_IN_KEYWORDS: u32 = 10;
const BRAND_IN_WEBSITE: u32 = 25;
const BRAND_IN_NAME: u32 = 20;
const LOCATION_IN_PROVINCE: u32 = 15;
const LOCATION_IN_ADDRESS: u32 = 10;
const FUZZY_PRODUCT: u32 = 25;
const FUZZY_WORD: u32 = 5;
const FUZZY_LOCATION: u32 = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relevance {
	pub score: u8,
	pub matched_fields: Vec<String>,
	pub explanation: String,
}

#[derive(Default)]
struct Tally {
	points: u32,
	fields: Vec<&'static str>,
	reasons: Vec<String>,
}
impl Tally {
	fn add(&mut self, points: u32, field: &'static str, reason: String) {
		self.points += points;

		if !self.fields.contains(&field) {
			self.fields.push(field);
		}
		if !self.reasons.contains(&reason) {
			self.reasons.push(reason);
		}
	}

	fn finish(self, cap: u8) -> Relevance {
		let score = self.points.min(u32::from(cap)) as u8;
		let explanation = if self.reasons.is_empty() {
			"General match for the query.".to_string()
		} else {
			self.reasons.join("; ")
		};

		Relevance {
			score,
			matched_fields: self.fields.into_iter().map(str::to_string).collect(),
			explanation,
		}
	}
}

/// Point-additive relevance in `[0, 100]`.
///
/// Company age is computed from `current_year`, so the same record can score differently across
/// calendar years.
pub fn score(company: &Company, criteria: &SearchCriteria, current_year: i32) -> Relevance {
	let mut tally = Tally::default();
	let products = lower(company.main_products.as_deref());
	let names = format!(
		"{} {}",
		lower(company.name_en.as_deref()),
		lower(company.name_cn.as_deref())
	);
	let keywords = lower(company.keywords.as_deref());

	for product in &criteria.products {
		let terms = lexicon::product_terms(product);

		if any_mention(&products, &terms) {
			tally.add(PRODUCT_IN_PRODUCTS, "main_products", format!("Main products mention {product}"));
		}
		if any_mention(&names, &terms) {
			tally.add(PRODUCT_IN_NAME, "company_name", format!("Company name mentions {product}"));
		}
		if any_mention(&keywords, &terms) {
			tally.add(PRODUCT_IN_KEYWORDS, "keywords", format!("Keywords mention {product}"));
		}
	}

	let websites = format!(
		"{} {}",
		lower(company.official_website.as_deref()),
		lower(company.fair_website.as_deref())
	);

	for brand in &criteria.brands {
		let brand_lower = brand.to_lowercase();

		if !brand_lower.is_empty() && websites.contains(&brand_lower) {
			tally.add(BRAND_IN_WEBSITE, "website", format!("Website matches brand {brand}"));
		}
		if lexicon::mentions(&names, brand) {
			tally.add(BRAND_IN_NAME, "company_name", format!("Company name matches brand {brand}"));
		}
	}

	if let Some(location) = criteria.location.as_deref() {
		let terms = lexicon::location_terms(location);

		if any_mention(&lower(company.province.as_deref()), &terms) {
			tally.add(LOCATION_IN_PROVINCE, "province", format!("Located in {location}"));
		}
		if any_mention(&lower(company.address.as_deref()), &terms) {
			tally.add(LOCATION_IN_ADDRESS, "address", format!("Address in {location}"));
		}
	}

	if let Some(employees) = company.insured_employees {
		if employees > 100 {
			tally.add(5, "insured_employees", format!("{employees} insured employees"));
		}
		if employees > 500 {
			tally.add(10, "insured_employees", format!("{employees} insured employees"));
		}
	}
	if let Some(age) = company.age(current_year) {
		if age > 10 {
			tally.add(5, "establishment_year", format!("Established {age} years ago"));
		}
		if age > 20 {
			tally.add(10, "establishment_year", format!("Established {age} years ago"));
		}
	}

	tally.finish(MAX_SCORE)
}

/// Approximate-match score used by the fuzzy strategy to discard weak candidates, capped at 90.
pub fn fuzzy_score(company: &Company, criteria: &SearchCriteria, query: &str) -> Relevance {
	let mut tally = Tally::default();
	let haystack = [
		company.main_products.as_deref(),
		company.keywords.as_deref(),
		company.category.as_deref(),
		company.name_en.as_deref(),
		company.name_cn.as_deref(),
	]
	.into_iter()
	.flatten()
	.collect::<Vec<_>>()
	.join(" ")
	.to_lowercase();

	for product in &criteria.products {
		if any_mention(&haystack, &lexicon::product_terms(product)) {
			tally.add(FUZZY_PRODUCT, "main_products", format!("Similar to {product}"));
		}
	}

	if tally.points == 0 {
		for word in filter::query_words(query) {
			if haystack.contains(&word) {
				tally.add(FUZZY_WORD, "keywords", format!("Mentions {word}"));
			}
		}
	}

	if let Some(location) = criteria.location.as_deref() {
		let place = format!(
			"{} {}",
			lower(company.province.as_deref()),
			lower(company.address.as_deref())
		);

		if any_mention(&place, &lexicon::location_terms(location)) {
			tally.add(FUZZY_LOCATION, "province", format!("Near {location}"));
		}
	}

	tally.finish(MAX_FUZZY_SCORE)
}

fn lower(value: Option<&str>) -> String {
	value.unwrap_or_default().to_lowercase()
}

fn any_mention(haystack_lower: &str, terms: &[String]) -> bool {
	!haystack_lower.is_empty() && terms.iter().any(|term| lexicon::mentions(haystack_lower, term))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn led_maker() -> Company {
		Company {
			name_en: Some("Foshan Bright LED Lighting Co., Ltd.".to_string()),
			province: Some("Guangdong".to_string()),
			address: Some("Foshan, Guangdong".to_string()),
			main_products: Some("LED bulbs, panel lights".to_string()),
			keywords: Some("lighting".to_string()),
			insured_employees: Some(600),
			establishment_year: Some(2000),
			..Default::default()
		}
	}

	#[test]
	fn rules_accumulate_in_evaluation_order() {
		let criteria = SearchCriteria {
			products: vec!["LED".to_string()],
			location: Some("Guangdong".to_string()),
			..Default::default()
		};
		let relevance = score(&led_maker(), &criteria, 2025);

		// 20 + 15 + 10 + 15 + 10 + 5 + 10 + 5 + 10 = 100.
		assert_eq!(relevance.score, 100);
		assert_eq!(
			relevance.matched_fields,
			vec![
				"main_products",
				"company_name",
				"keywords",
				"province",
				"address",
				"insured_employees",
				"establishment_year",
			]
		);
	}

	#[test]
	fn employee_and_age_bonuses_stack() {
		let company = Company {
			insured_employees: Some(501),
			establishment_year: Some(2004),
			..Default::default()
		};
		let relevance = score(&company, &SearchCriteria::default(), 2025);

		assert_eq!(relevance.score, 30);
		assert_eq!(relevance.matched_fields, vec!["insured_employees", "establishment_year"]);
	}

	#[test]
	fn empty_match_has_a_generic_explanation() {
		let relevance = score(&Company::default(), &SearchCriteria::default(), 2025);

		assert_eq!(relevance.score, 0);
		assert!(relevance.matched_fields.is_empty());
		assert_eq!(relevance.explanation, "General match for the query.");
	}

	#[test]
	fn brand_matches_website_and_name() {
		let company = Company {
			name_en: Some("Philips Lighting (China)".to_string()),
			official_website: Some("https://www.philips.com.cn".to_string()),
			..Default::default()
		};
		let criteria = SearchCriteria { brands: vec!["Philips".to_string()], ..Default::default() };

		assert_eq!(score(&company, &criteria, 2025).score, 45);
	}

	#[test]
	fn fuzzy_falls_back_to_query_words() {
		let company = Company {
			main_products: Some("drip tape and sprinkler heads".to_string()),
			..Default::default()
		};
		let relevance = fuzzy_score(&company, &SearchCriteria::default(), "sprinkler heads");

		assert_eq!(relevance.score, 10);
	}

	#[test]
	fn fuzzy_is_capped() {
		let criteria = SearchCriteria {
			products: vec![
				"LED".to_string(),
				"textiles".to_string(),
				"machinery".to_string(),
				"PVC".to_string(),
			],
			location: Some("Guangdong".to_string()),
			..Default::default()
		};
		let company = Company {
			main_products: Some("LED, textile, machinery, PVC".to_string()),
			province: Some("广东省".to_string()),
			..Default::default()
		};

		assert_eq!(fuzzy_score(&company, &criteria, "").score, MAX_FUZZY_SCORE);
	}
}
