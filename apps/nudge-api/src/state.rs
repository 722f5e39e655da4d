use std::sync::Arc;

use nudge_service::NudgeService;
use nudge_storage::{db::Db, vectors::VectorStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<NudgeService>,
}
impl AppState {
	pub async fn new(config: nudge_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let vectors = VectorStore::new(&config.storage.qdrant)?;
		let service = NudgeService::new(config, db, vectors);

		Ok(Self { service: Arc::new(service) })
	}
}
