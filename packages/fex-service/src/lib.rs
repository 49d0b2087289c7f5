pub mod breaker;
pub mod sample;
pub mod search;

mod error;

pub use breaker::{BreakerState, Breakers, CircuitBreaker};
pub use error::{Error, Result};
pub use sample::SampleSet;
pub use search::{MatchType, SearchRequest, SearchResponse, SearchResult, Tier};

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use fex_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use fex_domain::{Company, SortSpec, filter::CompanyFilter};
use fex_providers::{chat, embedding, rerank};
use fex_storage::{db::Db, memory::MemoryStore, models::CompanyStats, queries};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Number of buckets returned per stats breakdown.
pub const STATS_TOP: u32 = 20;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

/// Structured generation: the response must be a single JSON object.
pub trait ExtractorProvider
where
	Self: Send + Sync,
{
	fn extract<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<Value>>;
}

pub trait RerankProvider
where
	Self: Send + Sync,
{
	/// One 0-100 score per document, aligned by position. May be shorter than `docs`.
	fn rerank<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, Result<Vec<f32>>>;
}

/// Free-text generation, used for the conversational summary.
pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<String>>;
}

/// Read-only access to the company table.
pub trait CompanyStore
where
	Self: Send + Sync,
{
	fn find_companies<'a>(
		&'a self,
		filter: &'a CompanyFilter,
		sort: Option<&'a SortSpec>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Company>>>;

	fn find_similar<'a>(
		&'a self,
		embedding: &'a [f32],
		min_similarity: f32,
		filter: &'a CompanyFilter,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<(Company, f32)>>>;

	fn stats(&self, top: u32) -> BoxFuture<'_, Result<CompanyStats>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub extractor: Arc<dyn ExtractorProvider>,
	pub rerank: Arc<dyn RerankProvider>,
	pub generation: Arc<dyn GenerationProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		extractor: Arc<dyn ExtractorProvider>,
		rerank: Arc<dyn RerankProvider>,
		generation: Arc<dyn GenerationProvider>,
	) -> Self {
		Self { embedding, extractor, rerank, generation }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self {
			embedding: provider.clone(),
			extractor: provider.clone(),
			rerank: provider.clone(),
			generation: provider,
		}
	}
}

pub struct FexService {
	pub cfg: Config,
	pub store: Arc<dyn CompanyStore>,
	pub providers: Providers,
	pub breakers: Breakers,
	pub sample: Arc<SampleSet>,
}
impl FexService {
	pub fn new(cfg: Config, store: Arc<dyn CompanyStore>) -> Result<Self> {
		Self::with_providers(cfg, store, Providers::default())
	}

	pub fn with_providers(
		cfg: Config,
		store: Arc<dyn CompanyStore>,
		providers: Providers,
	) -> Result<Self> {
		let sample = match cfg.fallback.sample_path.as_deref() {
			Some(path) => SampleSet::load(path)?,
			None => SampleSet::builtin()?,
		};
		let breakers = Breakers::new(cfg.fallback.breaker);

		Ok(Self { cfg, store, providers, breakers, sample: Arc::new(sample) })
	}

	/// Replaces the static sample served by the last fallback tier.
	pub fn with_sample(mut self, sample: SampleSet) -> Self {
		self.sample = Arc::new(sample);

		self
	}

	pub async fn stats(&self) -> Result<CompanyStats> {
		if !self.breakers.store.allow() {
			return Err(Error::Unavailable { message: "Company store circuit is open.".to_string() });
		}

		let stats = self.store.stats(STATS_TOP).await;

		self.breakers.store.observe(&stats);

		stats
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}
impl ExtractorProvider for DefaultProviders {
	fn extract<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<Value>> {
		Box::pin(async move { Ok(chat::complete_json(cfg, messages).await?) })
	}
}
impl RerankProvider for DefaultProviders {
	fn rerank<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async move { Ok(rerank::rerank(cfg, query, docs).await?) })
	}
}
impl GenerationProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(chat::complete_text(cfg, messages).await?) })
	}
}

impl CompanyStore for Db {
	fn find_companies<'a>(
		&'a self,
		filter: &'a CompanyFilter,
		sort: Option<&'a SortSpec>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Company>>> {
		Box::pin(async move { Ok(queries::find_companies(self, filter, sort, limit).await?) })
	}

	fn find_similar<'a>(
		&'a self,
		embedding: &'a [f32],
		min_similarity: f32,
		filter: &'a CompanyFilter,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<(Company, f32)>>> {
		Box::pin(async move {
			Ok(queries::find_similar(self, embedding, min_similarity, filter, limit).await?)
		})
	}

	fn stats(&self, top: u32) -> BoxFuture<'_, Result<CompanyStats>> {
		Box::pin(async move { Ok(queries::company_stats(self, i64::from(top)).await?) })
	}
}

impl CompanyStore for MemoryStore {
	fn find_companies<'a>(
		&'a self,
		filter: &'a CompanyFilter,
		sort: Option<&'a SortSpec>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Company>>> {
		Box::pin(async move { Ok(MemoryStore::find_companies(self, filter, sort, limit)) })
	}

	fn find_similar<'a>(
		&'a self,
		embedding: &'a [f32],
		min_similarity: f32,
		filter: &'a CompanyFilter,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<(Company, f32)>>> {
		Box::pin(async move {
			Ok(MemoryStore::find_similar(self, embedding, min_similarity, filter, limit))
		})
	}

	fn stats(&self, top: u32) -> BoxFuture<'_, Result<CompanyStats>> {
		Box::pin(async move { Ok(MemoryStore::stats(self, top as usize)) })
	}
}
