//! Embedding backfill for companies whose vector is missing or out of date.

use std::time::Duration;

use time::OffsetDateTime;
use uuid::Uuid;

use fex_config::EmbeddingProviderConfig;
use fex_domain::Company;
use fex_providers::embedding;
use fex_storage::{
	db::Db,
	models::{EmbeddingCandidate, EmbeddingUpdate},
	queries,
};

use crate::{Error, Result};

pub struct WorkerState {
	pub db: Db,
	pub embedding: EmbeddingProviderConfig,
	pub batch_size: u32,
	pub poll_interval: Duration,
}

/// Totals for one sweep over the company table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
	pub scanned: usize,
	pub embedded: usize,
	pub skipped_empty: usize,
}

/// A company that needs a fresh vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEmbedding {
	pub id: Uuid,
	pub text: String,
	pub hash: String,
}

pub async fn run_worker(state: WorkerState) -> color_eyre::Result<()> {
	loop {
		match backfill_pass(&state).await {
			Ok(report) if report.embedded > 0 => {
				tracing::info!(
					scanned = report.scanned,
					embedded = report.embedded,
					skipped_empty = report.skipped_empty,
					"Embedding backfill pass finished."
				);
			},
			Ok(_) => {
				tracing::debug!("No stale embeddings found.");
			},
			Err(err) => {
				tracing::error!(error = %err, "Embedding backfill failed.");
			},
		}

		tokio::time::sleep(state.poll_interval).await;
	}
}

/// Walks the table in id order, embedding every stale company once.
pub async fn backfill_pass(state: &WorkerState) -> Result<PassReport> {
	let mut report = PassReport::default();
	let mut after: Option<Uuid> = None;

	loop {
		let candidates =
			queries::list_embedding_candidates(&state.db, after, state.batch_size).await?;
		let Some(last) = candidates.last() else {
			break;
		};

		after = Some(last.company.id);
		report.scanned += candidates.len();

		let page_len = candidates.len();
		let (pending, skipped) = select_pending(candidates);

		report.skipped_empty += skipped;

		if !pending.is_empty() {
			report.embedded += embed_and_store(state, pending).await?;
		}
		if page_len < state.batch_size as usize {
			break;
		}
	}

	Ok(report)
}

async fn embed_and_store(state: &WorkerState, pending: Vec<PendingEmbedding>) -> Result<usize> {
	let texts: Vec<String> = pending.iter().map(|item| item.text.clone()).collect();
	let vectors = embedding::embed(&state.embedding, &texts).await?;

	if vectors.len() != pending.len() {
		return Err(Error::Message(format!(
			"Embedding provider returned {} vectors for {} companies.",
			vectors.len(),
			pending.len()
		)));
	}

	let embedded_at = OffsetDateTime::now_utc();
	let mut stored = 0;

	for (item, vector) in pending.into_iter().zip(vectors) {
		let update = EmbeddingUpdate {
			id: item.id,
			embedding: vector,
			embedding_hash: item.hash,
			embedded_at,
		};

		queries::update_embedding(&state.db, &update).await?;

		stored += 1;
	}

	Ok(stored)
}

/// Keeps candidates with no vector or a stale hash. Returns them with the count of empty texts.
pub fn select_pending(candidates: Vec<EmbeddingCandidate>) -> (Vec<PendingEmbedding>, usize) {
	let mut pending = Vec::new();
	let mut skipped = 0;

	for candidate in candidates {
		let company: Company = candidate.company.into();
		let text = company.embedding_text();

		if text.trim().is_empty() {
			skipped += 1;

			continue;
		}

		let hash = embedding_hash(&text);

		if needs_embedding(candidate.has_embedding, candidate.embedding_hash.as_deref(), &hash) {
			pending.push(PendingEmbedding { id: company.id, text, hash });
		}
	}

	(pending, skipped)
}

pub fn embedding_hash(text: &str) -> String {
	blake3::hash(text.as_bytes()).to_hex().to_string()
}

pub fn needs_embedding(has_embedding: bool, stored_hash: Option<&str>, current_hash: &str) -> bool {
	!has_embedding || stored_hash != Some(current_hash)
}

#[cfg(test)]
mod tests {
	use fex_storage::models::CompanyRow;

	use super::*;

	fn row(name: Option<&str>, products: Option<&str>) -> CompanyRow {
		CompanyRow {
			id: Uuid::new_v4(),
			name_en: name.map(str::to_string),
			name_cn: None,
			registration_code: None,
			province: Some("Guangdong".to_string()),
			address: None,
			insured_employees: None,
			enterprise_scale: None,
			registered_capital: None,
			paid_capital: None,
			establishment_year: None,
			main_products: products.map(str::to_string),
			keywords: None,
			category: None,
			industry: None,
			business_scope: None,
			profile: None,
			credit_score: None,
			credit_rating: None,
			phones: None,
			emails: None,
			official_website: None,
			fair_website: None,
		}
	}

	fn candidate(
		company: CompanyRow,
		has_embedding: bool,
		hash: Option<String>,
	) -> EmbeddingCandidate {
		EmbeddingCandidate { company, has_embedding, embedding_hash: hash }
	}

	#[test]
	fn hash_is_stable_hex() {
		let a = embedding_hash("Bright LED LED lighting Guangdong");

		assert_eq!(a, embedding_hash("Bright LED LED lighting Guangdong"));
		assert_ne!(a, embedding_hash("Bright LED LED bulbs Guangdong"));
		assert_eq!(a.len(), 64);
		assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
	}

	#[test]
	fn stale_or_missing_vectors_need_work() {
		assert!(needs_embedding(false, None, "abc"));
		assert!(needs_embedding(false, Some("abc"), "abc"));
		assert!(needs_embedding(true, Some("old"), "abc"));
		assert!(needs_embedding(true, None, "abc"));
		assert!(!needs_embedding(true, Some("abc"), "abc"));
	}

	#[test]
	fn selection_skips_fresh_and_empty_rows() {
		let current = Company::from(row(Some("Bright LED"), Some("LED lighting"))).embedding_text();
		let fresh =
			candidate(row(Some("Bright LED"), Some("LED lighting")), true, Some(embedding_hash(&current)));
		let stale =
			candidate(row(Some("Ningbo Textiles"), Some("cotton")), true, Some("old".to_string()));
		let missing = candidate(row(Some("Foshan Lamps"), None), false, None);
		let mut blank_row = row(None, None);

		blank_row.province = None;

		let blank = candidate(blank_row, false, None);
		let stale_id = stale.company.id;
		let missing_id = missing.company.id;
		let (pending, skipped) = select_pending(vec![fresh, stale, missing, blank]);

		assert_eq!(skipped, 1);
		assert_eq!(
			pending.iter().map(|item| item.id).collect::<Vec<_>>(),
			vec![stale_id, missing_id]
		);
		assert!(pending[0].text.contains("Ningbo Textiles"));
		assert_eq!(pending[0].hash, embedding_hash(&pending[0].text));
	}
}
