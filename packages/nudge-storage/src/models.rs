use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct TaskRow {
	pub task_id: Uuid,
	pub user_id: Uuid,
	pub title: String,
	pub description: Option<String>,
	pub status: String,
	pub priority: String,
	pub is_active: bool,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub due_date: Option<OffsetDateTime>,
	pub completed_at: Option<OffsetDateTime>,
	pub labeling_status: String,
	pub labeling_attempted_at: Option<OffsetDateTime>,
	pub labeling_completed_at: Option<OffsetDateTime>,
	pub labeling_error: Option<String>,
	pub vector_id: Option<String>,
	pub embedding_model: Option<String>,
	pub embedding_version: Option<String>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct TaskLabelRow {
	pub label_id: Uuid,
	pub task_id: Uuid,
	pub name: String,
	pub category: String,
	pub confidence: f32,
	pub is_primary: bool,
	pub is_user_edited: bool,
	pub original_name: Option<String>,
	pub reasoning: Option<String>,
	pub metadata: Value,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
