use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub fallback: Fallback,
	#[serde(default)]
	pub worker: Worker,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	/// Upper bound on accepted query text, in characters.
	#[serde(default = "default_max_query_chars")]
	pub max_query_chars: u32,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm_extractor: LlmProviderConfig,
	pub rerank: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub default_limit: u32,
	pub max_limit: u32,
	/// Per-strategy deadline. A strategy that misses it contributes nothing.
	pub strategy_timeout_ms: u64,
	pub usd_to_cny_rate: f64,
	pub shares: SearchShares,
	pub semantic: SearchSemantic,
	pub fuzzy: SearchFuzzy,
	pub combine: SearchCombine,
	pub expansion: SearchExpansion,
	pub summary: SearchSummary,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			default_limit: 10,
			max_limit: 50,
			strategy_timeout_ms: 4_000,
			usd_to_cny_rate: 7.2,
			shares: SearchShares::default(),
			semantic: SearchSemantic::default(),
			fuzzy: SearchFuzzy::default(),
			combine: SearchCombine::default(),
			expansion: SearchExpansion::default(),
			summary: SearchSummary::default(),
		}
	}
}

/// Fractions of the requested limit handed to each retrieval strategy.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SearchShares {
	pub exact: f32,
	pub semantic: f32,
	pub fuzzy: f32,
}
impl Default for SearchShares {
	fn default() -> Self {
		Self { exact: 0.6, semantic: 0.3, fuzzy: 0.1 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchSemantic {
	pub similarity_threshold: f32,
}
impl Default for SearchSemantic {
	fn default() -> Self {
		Self { similarity_threshold: 0.7 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchFuzzy {
	pub min_score: u8,
	pub overfetch: u32,
}
impl Default for SearchFuzzy {
	fn default() -> Self {
		Self { min_score: 30, overfetch: 3 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchCombine {
	pub exact_bonus: u8,
	pub rerank_enabled: bool,
	/// Rerank only runs when the merged list is strictly larger than this.
	pub rerank_min_candidates: u32,
	pub rerank_top_k: u32,
}
impl Default for SearchCombine {
	fn default() -> Self {
		Self { exact_bonus: 20, rerank_enabled: true, rerank_min_candidates: 3, rerank_top_k: 10 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchExpansion {
	pub enabled: bool,
	pub max_terms: u32,
}
impl Default for SearchExpansion {
	fn default() -> Self {
		Self { enabled: true, max_terms: 8 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchSummary {
	pub enabled: bool,
}
impl Default for SearchSummary {
	fn default() -> Self {
		Self { enabled: true }
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Fallback {
	/// Replaces the built-in sample companies served by the last-resort tier.
	pub sample_path: Option<PathBuf>,
	pub breaker: Breaker,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Breaker {
	pub failure_threshold: u32,
	pub cooldown_ms: u64,
}
impl Default for Breaker {
	fn default() -> Self {
		Self { failure_threshold: 3, cooldown_ms: 30_000 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Worker {
	pub poll_interval_ms: u64,
	pub batch_size: u32,
}
impl Default for Worker {
	fn default() -> Self {
		Self { poll_interval_ms: 60_000, batch_size: 50 }
	}
}

fn default_max_query_chars() -> u32 {
	1_000
}
