mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Breaker, Config, EmbeddingProviderConfig, Fallback, LlmProviderConfig, Postgres, Providers,
	Search, SearchCombine, SearchExpansion, SearchFuzzy, SearchSemantic, SearchShares,
	SearchSummary, Service, Storage, Worker,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.max_query_chars == 0 {
		return Err(Error::Validation {
			message: "service.max_query_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.vector_dim.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm_extractor", &cfg.providers.llm_extractor.api_key),
		("rerank", &cfg.providers.rerank.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	validate_search(&cfg.search)?;

	if cfg.fallback.breaker.failure_threshold == 0 {
		return Err(Error::Validation {
			message: "fallback.breaker.failure_threshold must be greater than zero.".to_string(),
		});
	}
	if cfg.fallback.breaker.cooldown_ms == 0 {
		return Err(Error::Validation {
			message: "fallback.breaker.cooldown_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.worker.batch_size == 0 {
		return Err(Error::Validation {
			message: "worker.batch_size must be greater than zero.".to_string(),
		});
	}
	if cfg.worker.poll_interval_ms == 0 {
		return Err(Error::Validation {
			message: "worker.poll_interval_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn validate_search(search: &Search) -> Result<()> {
	if search.max_limit == 0 {
		return Err(Error::Validation {
			message: "search.max_limit must be greater than zero.".to_string(),
		});
	}
	if search.default_limit == 0 || search.default_limit > search.max_limit {
		return Err(Error::Validation {
			message: "search.default_limit must be between 1 and search.max_limit.".to_string(),
		});
	}
	if search.strategy_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "search.strategy_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if !search.usd_to_cny_rate.is_finite() || search.usd_to_cny_rate <= 0.0 {
		return Err(Error::Validation {
			message: "search.usd_to_cny_rate must be a positive finite number.".to_string(),
		});
	}

	let shares = search.shares;

	for (label, share) in [
		("search.shares.exact", shares.exact),
		("search.shares.semantic", shares.semantic),
		("search.shares.fuzzy", shares.fuzzy),
	] {
		if !share.is_finite() || !(0.0..=1.0).contains(&share) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if shares.exact + shares.semantic + shares.fuzzy <= 0.0 {
		return Err(Error::Validation {
			message: "search.shares must sum to a value greater than zero.".to_string(),
		});
	}

	let threshold = search.semantic.similarity_threshold;

	if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
		return Err(Error::Validation {
			message: "search.semantic.similarity_threshold must be in the range 0.0-1.0."
				.to_string(),
		});
	}
	if search.fuzzy.min_score > 100 {
		return Err(Error::Validation {
			message: "search.fuzzy.min_score must be 100 or less.".to_string(),
		});
	}
	if search.fuzzy.overfetch == 0 {
		return Err(Error::Validation {
			message: "search.fuzzy.overfetch must be greater than zero.".to_string(),
		});
	}
	if search.combine.exact_bonus > 100 {
		return Err(Error::Validation {
			message: "search.combine.exact_bonus must be 100 or less.".to_string(),
		});
	}
	if search.combine.rerank_top_k == 0 {
		return Err(Error::Validation {
			message: "search.combine.rerank_top_k must be greater than zero.".to_string(),
		});
	}
	if search.expansion.enabled && search.expansion.max_terms == 0 {
		return Err(Error::Validation {
			message: "search.expansion.max_terms must be greater than zero when enabled."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
	if cfg
		.fallback
		.sample_path
		.as_deref()
		.map(|path| path.as_os_str().is_empty())
		.unwrap_or(false)
	{
		cfg.fallback.sample_path = None;
	}
}
