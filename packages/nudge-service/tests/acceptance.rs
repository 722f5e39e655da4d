mod acceptance {
	mod embedding_failures;
	mod labeling_runs;
	mod recommendations;

	use std::{env, sync::Arc};

	use serde_json::Map;

	use nudge_config::{
		Config, EmbeddingProviderConfig, Labeling, LlmProviderConfig, Postgres,
		Providers as ProviderConfigs, Qdrant, Recommendation, Service, Storage,
	};
	use nudge_service::{
		BoxFuture, CompletionProvider, EmbeddingProvider, NudgeService, Providers,
	};
	use nudge_storage::{db::Db, vectors::VectorStore};
	use nudge_testkit::TestDatabase;

	/// Returns the same canned assistant text for every completion call.
	pub struct StubCompletion {
		pub content: String,
	}
	impl CompletionProvider for StubCompletion {
		fn complete<'a>(
			&'a self,
			_cfg: &'a LlmProviderConfig,
			_system_prompt: &'a str,
			_user_prompt: &'a str,
			_temperature: f32,
			_max_tokens: u32,
		) -> BoxFuture<'a, color_eyre::Result<String>> {
			let content = self.content.clone();

			Box::pin(async move { Ok(content) })
		}
	}

	pub struct StubEmbedding {
		pub vector_dim: u32,
	}
	impl EmbeddingProvider for StubEmbedding {
		fn embed<'a>(
			&'a self,
			_cfg: &'a EmbeddingProviderConfig,
			_text: &'a str,
		) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
			let dim = self.vector_dim as usize;

			Box::pin(async move { Ok(vec![0.25; dim]) })
		}
	}

	pub struct FailingEmbedding;
	impl EmbeddingProvider for FailingEmbedding {
		fn embed<'a>(
			&'a self,
			_cfg: &'a EmbeddingProviderConfig,
			_text: &'a str,
		) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
			Box::pin(async move { Err(color_eyre::eyre::eyre!("embedding collaborator down")) })
		}
	}

	pub fn stub_providers(
		completion: StubCompletion,
		embedding: Arc<dyn EmbeddingProvider>,
	) -> Providers {
		Providers::new(Arc::new(completion), embedding)
	}

	pub fn test_qdrant_url() -> Option<String> {
		env::var("NUDGE_QDRANT_URL").ok()
	}

	pub async fn test_db() -> Option<TestDatabase> {
		let base_dsn = nudge_testkit::env_dsn()?;
		let db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");

		Some(db)
	}

	pub fn test_config(
		dsn: String,
		qdrant_url: String,
		vector_dim: u32,
		collection: String,
	) -> Config {
		Config {
			service: Service {
				http_bind: "127.0.0.1:0".to_string(),
				log_level: "info".to_string(),
				bind_localhost_only: true,
			},
			storage: Storage {
				postgres: Postgres { dsn, pool_max_conns: 2 },
				qdrant: Qdrant { url: qdrant_url, collection, vector_dim },
			},
			providers: ProviderConfigs {
				llm: dummy_llm_provider(),
				embedding: dummy_embedding_provider(vector_dim),
			},
			labeling: Labeling::default(),
			recommendation: Recommendation::default(),
		}
	}

	pub fn dummy_llm_provider() -> LlmProviderConfig {
		LlmProviderConfig {
			provider_id: "test".to_string(),
			api_base: "http://127.0.0.1:1".to_string(),
			api_key: "test-key".to_string(),
			path: "/".to_string(),
			model: "test".to_string(),
			timeout_ms: 1_000,
			default_headers: Map::new(),
		}
	}

	pub fn dummy_embedding_provider(vector_dim: u32) -> EmbeddingProviderConfig {
		EmbeddingProviderConfig {
			provider_id: "test".to_string(),
			api_base: "http://127.0.0.1:1".to_string(),
			api_key: "test-key".to_string(),
			path: "/".to_string(),
			model: "test".to_string(),
			dimensions: vector_dim,
			timeout_ms: 1_000,
			default_headers: Map::new(),
		}
	}

	pub async fn build_service(cfg: Config, providers: Providers) -> NudgeService {
		let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect test db.");

		db.ensure_schema().await.expect("Failed to bootstrap test schema.");

		let vectors =
			VectorStore::new(&cfg.storage.qdrant).expect("Failed to build vector store.");

		NudgeService::with_providers(cfg, db, vectors, providers)
	}

	/// A seven-label batch spanning four categories, confidences descending
	/// from 0.95.
	pub fn sample_batch_json() -> String {
		serde_json::json!({
			"labels": [
				{ "label_name": "home", "category": "location", "confidence": 0.95, "reasoning": "r" },
				{ "label_name": "evening", "category": "time", "confidence": 0.9, "reasoning": "r" },
				{ "label_name": "low-energy", "category": "energy", "confidence": 0.85, "reasoning": "r" },
				{ "label_name": "quick-5min", "category": "duration", "confidence": 0.8, "reasoning": "r" },
				{ "label_name": "solo", "category": "context", "confidence": 0.75, "reasoning": "r" },
				{ "label_name": "indoors", "category": "context", "confidence": 0.7, "reasoning": "r" },
				{ "label_name": "household", "category": "category", "confidence": 0.65, "reasoning": "r" }
			],
			"summary": "Simple evening chore.",
			"external_factors_considered": ["time of day"]
		})
		.to_string()
	}

	pub fn undersized_batch_json() -> String {
		serde_json::json!({
			"labels": [
				{ "label_name": "home", "category": "location", "confidence": 0.9, "reasoning": "r" },
				{ "label_name": "evening", "category": "time", "confidence": 0.8, "reasoning": "r" },
				{ "label_name": "solo", "category": "context", "confidence": 0.7, "reasoning": "r" },
				{ "label_name": "indoors", "category": "context", "confidence": 0.6, "reasoning": "r" }
			],
			"summary": "Too small.",
			"external_factors_considered": []
		})
		.to_string()
	}

	#[derive(Debug, sqlx::FromRow)]
	pub struct StoredLabel {
		pub name: String,
		pub confidence: f32,
		pub is_primary: bool,
	}

	pub async fn stored_labels(service: &NudgeService, task_id: uuid::Uuid) -> Vec<StoredLabel> {
		sqlx::query_as::<_, StoredLabel>(
			"\
SELECT name, confidence, is_primary
FROM task_labels
WHERE task_id = $1
ORDER BY confidence DESC, created_at ASC",
		)
		.bind(task_id)
		.fetch_all(&service.db.pool)
		.await
		.expect("Failed to load stored labels.")
	}
}
