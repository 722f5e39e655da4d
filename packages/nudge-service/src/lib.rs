pub mod embedding_sync;
pub mod extract;
pub mod labeling;
pub mod labels;
pub mod recommend;
pub mod tasks;
pub mod time_serde;

mod prompts;

use std::{future::Future, pin::Pin, sync::Arc};

pub use labeling::{EmbeddingOutcome, LabelingContext, LabelingRun};
pub use labels::{LabelResponse, LabelingStatusReport, UpdateLabelRequest};
pub use recommend::{
	RecommendRequest, RecommendResponse, TaskRecommendation, TaskSuggestion,
};
pub use tasks::{
	CreateTaskRequest, DeleteTaskOutcome, TaskListRequest, TaskListResponse, TaskResponse,
	TaskWrite, UpdateTaskRequest,
};

use nudge_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use nudge_providers::{completion, embedding};
use nudge_storage::{db::Db, vectors::VectorStore};

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Narrow interface over the chat-completion collaborator; constructed once
/// per process and injected so tests can substitute fakes.
pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		system_prompt: &'a str,
		user_prompt: &'a str,
		temperature: f32,
		max_tokens: u32,
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub completion: Arc<dyn CompletionProvider>,
	pub embedding: Arc<dyn EmbeddingProvider>,
}
impl Providers {
	pub fn new(
		completion: Arc<dyn CompletionProvider>,
		embedding: Arc<dyn EmbeddingProvider>,
	) -> Self {
		Self { completion, embedding }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { completion: provider.clone(), embedding: provider }
	}
}

pub struct NudgeService {
	pub cfg: Config,
	pub db: Db,
	pub vectors: VectorStore,
	pub providers: Providers,
}
impl NudgeService {
	pub fn new(cfg: Config, db: Db, vectors: VectorStore) -> Self {
		Self { cfg, db, vectors, providers: Providers::default() }
	}

	pub fn with_providers(
		cfg: Config,
		db: Db,
		vectors: VectorStore,
		providers: Providers,
	) -> Self {
		Self { cfg, db, vectors, providers }
	}
}

#[derive(Debug)]
pub enum ServiceError {
	NotFound { what: String },
	InvalidRequest { message: String },
	Validation { message: String },
	Provider { message: String },
	Storage { message: String },
	Vector { message: String },
}
impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::NotFound { what } => write!(f, "Not found: {what}"),
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::Validation { message } => write!(f, "Validation failed: {message}"),
			Self::Provider { message } => write!(f, "Provider error: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
			Self::Vector { message } => write!(f, "Vector store error: {message}"),
		}
	}
}
impl std::error::Error for ServiceError {}
impl From<sqlx::Error> for ServiceError {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
impl From<nudge_storage::Error> for ServiceError {
	fn from(err: nudge_storage::Error) -> Self {
		match err {
			nudge_storage::Error::Qdrant(err) => Self::Vector { message: err.to_string() },
			nudge_storage::Error::Sqlx(err) => Self::Storage { message: err.to_string() },
		}
	}
}
impl From<color_eyre::Report> for ServiceError {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

struct DefaultProviders;

impl CompletionProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		system_prompt: &'a str,
		user_prompt: &'a str,
		temperature: f32,
		max_tokens: u32,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(completion::complete(cfg, system_prompt, user_prompt, temperature, max_tokens))
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(embedding::embed_one(cfg, text))
	}
}

/// Truncates on character boundaries; error and warning columns carry
/// configured caps.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
	if text.chars().count() <= max_chars {
		return text.to_string();
	}

	text.chars().take(max_chars).collect()
}
