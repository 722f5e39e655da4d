use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub labeling: Labeling,
	#[serde(default)]
	pub recommendation: Recommendation,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	#[serde(default = "default_bind_localhost_only")]
	pub bind_localhost_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub llm: LlmProviderConfig,
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	#[serde(default = "default_llm_path")]
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	#[serde(default = "default_embedding_path")]
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Labeling {
	/// Minimum number of labels a generated batch must carry.
	pub min_labels: u32,
	/// Minimum number of distinct categories across a batch.
	pub min_categories: u32,
	/// How many top-confidence labels are flagged primary.
	pub primary_count: u32,
	pub max_error_chars: u32,
	pub max_warning_chars: u32,
}
impl Default for Labeling {
	fn default() -> Self {
		Self {
			min_labels: 6,
			min_categories: 3,
			primary_count: 5,
			max_error_chars: 500,
			max_warning_chars: 200,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Recommendation {
	pub default_top_k: u32,
	pub max_top_k: u32,
	pub max_suggestions: u32,
}
impl Default for Recommendation {
	fn default() -> Self {
		Self { default_top_k: 3, max_top_k: 10, max_suggestions: 3 }
	}
}

fn default_bind_localhost_only() -> bool {
	true
}

fn default_llm_path() -> String {
	"/chat/completions".to_string()
}

fn default_embedding_path() -> String {
	"/embeddings".to_string()
}
