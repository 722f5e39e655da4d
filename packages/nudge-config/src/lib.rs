mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Labeling, LlmProviderConfig, Postgres, Providers, Qdrant,
	Recommendation, Service, Storage,
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
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.labeling.min_labels == 0 {
		return Err(Error::Validation {
			message: "labeling.min_labels must be greater than zero.".to_string(),
		});
	}
	if cfg.labeling.min_categories == 0 || cfg.labeling.min_categories > 12 {
		return Err(Error::Validation {
			message: "labeling.min_categories must be between 1 and 12.".to_string(),
		});
	}
	if cfg.labeling.primary_count == 0 {
		return Err(Error::Validation {
			message: "labeling.primary_count must be greater than zero.".to_string(),
		});
	}
	if cfg.labeling.max_error_chars == 0 || cfg.labeling.max_warning_chars == 0 {
		return Err(Error::Validation {
			message: "labeling error truncation limits must be greater than zero.".to_string(),
		});
	}
	if cfg.recommendation.default_top_k == 0 {
		return Err(Error::Validation {
			message: "recommendation.default_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.recommendation.max_top_k < cfg.recommendation.default_top_k {
		return Err(Error::Validation {
			message: "recommendation.max_top_k must be at least recommendation.default_top_k."
				.to_string(),
		});
	}

	for (label, key) in [
		("llm", &cfg.providers.llm.api_key),
		("embedding", &cfg.providers.embedding.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}
	for (label, timeout) in [
		("llm", cfg.providers.llm.timeout_ms),
		("embedding", cfg.providers.embedding.timeout_ms),
	] {
		if timeout == 0 {
			return Err(Error::Validation {
				message: format!("Provider {label} timeout_ms must be greater than zero."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.providers.llm.path.trim().is_empty() {
		cfg.providers.llm.path = "/chat/completions".to_string();
	}
	if cfg.providers.embedding.path.trim().is_empty() {
		cfg.providers.embedding.path = "/embeddings".to_string();
	}
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
