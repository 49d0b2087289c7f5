//! In-memory company store with the same predicate, ordering and similarity semantics as the
//! Postgres queries. Used by tests and small offline deployments.

use std::collections::BTreeMap;

use fex_domain::{
	Company, SortSpec,
	filter::{self, CompanyFilter},
};

use crate::models::CompanyStats;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
	records: Vec<MemoryRecord>,
}

#[derive(Debug, Clone)]
struct MemoryRecord {
	company: Company,
	embedding: Option<Vec<f32>>,
}

impl MemoryStore {
	pub fn new(companies: impl IntoIterator<Item = Company>) -> Self {
		let mut store = Self::default();

		for company in companies {
			store.upsert(company, None);
		}

		store
	}

	pub fn upsert(&mut self, company: Company, embedding: Option<Vec<f32>>) {
		match self.records.iter_mut().find(|record| record.company.id == company.id) {
			Some(record) => {
				record.company = company;
				record.embedding = embedding.or(record.embedding.take());
			},
			None => self.records.push(MemoryRecord { company, embedding }),
		}
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn find_companies(
		&self,
		filter: &CompanyFilter,
		sort: Option<&SortSpec>,
		limit: u32,
	) -> Vec<Company> {
		let mut hits: Vec<Company> = self
			.records
			.iter()
			.filter(|record| filter.matches(&record.company))
			.map(|record| record.company.clone())
			.collect();

		filter::sort_companies(&mut hits, sort);
		hits.truncate(limit as usize);

		hits
	}

	pub fn find_similar(
		&self,
		embedding: &[f32],
		min_similarity: f32,
		filter: &CompanyFilter,
		limit: u32,
	) -> Vec<(Company, f32)> {
		let mut hits: Vec<(Company, f32)> = self
			.records
			.iter()
			.filter(|record| filter.matches(&record.company))
			.filter_map(|record| {
				let similarity = cosine_similarity(embedding, record.embedding.as_deref()?)?;

				(similarity > min_similarity).then(|| (record.company.clone(), similarity))
			})
			.collect();

		hits.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));
		hits.truncate(limit as usize);

		hits
	}

	pub fn stats(&self, top: usize) -> CompanyStats {
		let mut provinces: BTreeMap<&str, i64> = BTreeMap::new();
		let mut industries: BTreeMap<&str, i64> = BTreeMap::new();

		for record in &self.records {
			if let Some(province) = non_blank(record.company.province.as_deref()) {
				*provinces.entry(province).or_default() += 1;
			}
			if let Some(industry) = non_blank(record.company.industry.as_deref()) {
				*industries.entry(industry).or_default() += 1;
			}
		}

		CompanyStats {
			total_companies: self.records.len() as i64,
			with_embeddings: self.records.iter().filter(|record| record.embedding.is_some()).count()
				as i64,
			by_province: top_counts(provinces, top),
			by_industry: top_counts(industries, top),
		}
	}
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.filter(|value| !value.trim().is_empty())
}

fn top_counts(counts: BTreeMap<&str, i64>, top: usize) -> Vec<(String, i64)> {
	let mut out: Vec<(String, i64)> =
		counts.into_iter().map(|(key, count)| (key.to_string(), count)).collect();

	// BTreeMap iteration already orders ties by key.
	out.sort_by(|a, b| b.1.cmp(&a.1));
	out.truncate(top);

	out
}

/// `None` when dimensions differ or either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
	if a.len() != b.len() || a.is_empty() {
		return None;
	}

	let (mut dot, mut norm_a, mut norm_b) = (0.0_f32, 0.0_f32, 0.0_f32);

	for (x, y) in a.iter().zip(b) {
		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return None;
	}

	Some(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use fex_domain::{SearchCriteria, filter::hard_constraints};

	fn company(name: &str, province: &str, employees: i64) -> Company {
		Company {
			id: uuid::Uuid::new_v4(),
			name_en: Some(name.to_string()),
			province: Some(province.to_string()),
			industry: Some("Lighting".to_string()),
			insured_employees: Some(employees),
			..Default::default()
		}
	}

	#[test]
	fn similarity_threshold_is_strict() {
		let mut store = MemoryStore::default();

		store.upsert(company("same", "Fujian", 10), Some(vec![1.0, 0.0]));
		store.upsert(company("orthogonal", "Fujian", 10), Some(vec![0.0, 1.0]));
		store.upsert(company("no vector", "Fujian", 10), None);

		let hits = store.find_similar(&[1.0, 0.0], 0.7, &CompanyFilter::default(), 10);

		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].0.display_name(), "same");
		assert!(store.find_similar(&[1.0, 0.0], 1.0, &CompanyFilter::default(), 10).is_empty());
	}

	#[test]
	fn similar_results_respect_hard_constraints() {
		let mut store = MemoryStore::default();

		store.upsert(company("gd", "Guangdong", 10), Some(vec![1.0, 0.0]));
		store.upsert(company("fj", "Fujian", 10), Some(vec![0.9, 0.1]));

		let criteria = SearchCriteria {
			provinces_excluded: vec!["Guangdong".to_string()],
			..Default::default()
		};
		let hits = store.find_similar(&[1.0, 0.0], 0.5, &hard_constraints(&criteria, 2025), 10);

		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].0.display_name(), "fj");
	}

	#[test]
	fn stats_count_provinces_and_industries() {
		let store = MemoryStore::new([
			company("a", "Guangdong", 1),
			company("b", "Guangdong", 2),
			company("c", "Fujian", 3),
		]);
		let stats = store.stats(20);

		assert_eq!(stats.total_companies, 3);
		assert_eq!(stats.with_embeddings, 0);
		assert_eq!(stats.by_province, vec![("Guangdong".to_string(), 2), ("Fujian".to_string(), 1)]);
		assert_eq!(stats.by_industry, vec![("Lighting".to_string(), 3)]);
	}

	#[test]
	fn cosine_rejects_mismatched_dimensions() {
		assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), None);
		assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), None);
	}
}
