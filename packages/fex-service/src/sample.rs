//! Static company sample served when the store cannot be reached.

use std::{fs, path::Path};

use unicode_segmentation::UnicodeSegmentation;

use fex_domain::{Company, filter::CompanyFilter, lexicon};

use crate::{Error, Result};

const BUILTIN: &str = include_str!("../fixtures/sample_companies.json");
const STOPWORDS: &[&str] = &[
	"a", "an", "and", "are", "at", "by", "co", "for", "from", "in", "is", "me", "of", "on", "or",
	"the", "to", "with", "find", "show", "list", "search", "company", "companies", "ltd", "de",
	"en", "la", "el", "y",
];

#[derive(Debug, Clone, Default)]
pub struct SampleSet {
	companies: Vec<Company>,
}
impl SampleSet {
	pub fn new(companies: Vec<Company>) -> Self {
		Self { companies }
	}

	pub fn builtin() -> Result<Self> {
		Self::parse(BUILTIN, "builtin sample")
	}

	pub fn load(path: &Path) -> Result<Self> {
		let raw = fs::read_to_string(path).map_err(|err| Error::Unavailable {
			message: format!("Failed to read sample fixture {}: {err}.", path.display()),
		})?;

		Self::parse(&raw, &path.display().to_string())
	}

	fn parse(raw: &str, origin: &str) -> Result<Self> {
		let companies: Vec<Company> = serde_json::from_str(raw).map_err(|err| {
			Error::Unavailable { message: format!("Failed to parse {origin}: {err}.") }
		})?;

		Ok(Self { companies })
	}

	pub fn companies(&self) -> &[Company] {
		&self.companies
	}

	pub fn is_empty(&self) -> bool {
		self.companies.is_empty()
	}

	/// Naive substring match of query tokens and their lexicon synonyms. A query without usable
	/// tokens matches everything. `filter` still applies.
	pub fn matching(&self, query: &str, filter: &CompanyFilter, limit: usize) -> Vec<Company> {
		let needles = needles(query);

		self.companies
			.iter()
			.filter(|company| filter.matches(company))
			.filter(|company| {
				if needles.is_empty() {
					return true;
				}

				let text = company.searchable_text();

				needles.iter().any(|needle| text.contains(needle.as_str()))
			})
			.take(limit)
			.cloned()
			.collect()
	}
}

fn needles(query: &str) -> Vec<String> {
	let lower = query.to_lowercase();
	let mut out: Vec<String> = Vec::new();
	let mut push = |value: &str| {
		let value = value.to_lowercase();

		if !out.contains(&value) {
			out.push(value);
		}
	};

	for word in lower.unicode_words() {
		if word.chars().count() >= 2 && !STOPWORDS.contains(&word) {
			push(word);
		}
	}
	for hit in lexicon::find_products(&lower) {
		hit.entry.terms.iter().for_each(|term| push(term));
	}
	for hit in lexicon::find_locations(&lower) {
		hit.entry.terms.iter().for_each(|term| push(term));
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builtin_fixture_parses() {
		let sample = SampleSet::builtin().expect("builtin sample must parse");

		assert_eq!(sample.companies().len(), 5);
		assert!(sample.companies().iter().all(|company| company.registration_code.is_some()));
	}

	#[test]
	fn synonyms_widen_the_match() {
		let sample = SampleSet::builtin().expect("builtin sample must parse");
		let hits = sample.matching("灌溉设备", &CompanyFilter::default(), 10);

		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].display_name(), "Dayu Irrigation Systems Co., Ltd.");

		let hits = sample.matching("textiles", &CompanyFilter::default(), 10);

		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].province.as_deref(), Some("Zhejiang"));
	}

	#[test]
	fn blank_query_returns_the_sample_up_to_the_limit() {
		let sample = SampleSet::builtin().expect("builtin sample must parse");

		assert_eq!(sample.matching("", &CompanyFilter::default(), 3).len(), 3);
		assert_eq!(sample.matching("the of", &CompanyFilter::default(), 10).len(), 5);
	}
}
