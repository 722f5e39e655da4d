use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{NudgeService, ServiceError, ServiceResult, time_serde};
use nudge_domain::task::{LabelingStatus, TaskPriority, TaskStatus, UnknownVariant};
use nudge_storage::{
	models::TaskRow,
	queries::{self, TaskListFilter},
};

const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone, Debug, Deserialize)]
pub struct CreateTaskRequest {
	pub title: String,
	pub description: Option<String>,
	pub status: Option<TaskStatus>,
	pub priority: Option<TaskPriority>,
	#[serde(default, with = "time_serde::option")]
	pub due_date: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
	pub title: Option<String>,
	pub description: Option<String>,
	pub status: Option<TaskStatus>,
	pub priority: Option<TaskPriority>,
	#[serde(default, with = "time_serde::option")]
	pub due_date: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TaskListRequest {
	#[serde(default = "default_page")]
	pub page: u32,
	#[serde(default = "default_page_size")]
	pub page_size: u32,
	pub status: Option<TaskStatus>,
	pub priority: Option<TaskPriority>,
	#[serde(default = "default_is_active")]
	pub is_active: Option<bool>,
	pub search: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TaskResponse {
	pub task_id: Uuid,
	pub title: String,
	pub description: Option<String>,
	pub status: TaskStatus,
	pub priority: TaskPriority,
	pub is_active: bool,
	#[serde(with = "time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time_serde")]
	pub updated_at: OffsetDateTime,
	#[serde(with = "time_serde::option")]
	pub due_date: Option<OffsetDateTime>,
	#[serde(with = "time_serde::option")]
	pub completed_at: Option<OffsetDateTime>,
	pub labeling_status: LabelingStatus,
	#[serde(with = "time_serde::option")]
	pub labeling_attempted_at: Option<OffsetDateTime>,
	#[serde(with = "time_serde::option")]
	pub labeling_completed_at: Option<OffsetDateTime>,
	pub labeling_error: Option<String>,
	pub vector_id: Option<String>,
}
impl TaskResponse {
	pub(crate) fn try_from_row(row: TaskRow) -> ServiceResult<Self> {
		Ok(Self {
			task_id: row.task_id,
			title: row.title,
			description: row.description,
			status: parse_variant(&row.status)?,
			priority: parse_variant(&row.priority)?,
			is_active: row.is_active,
			created_at: row.created_at,
			updated_at: row.updated_at,
			due_date: row.due_date,
			completed_at: row.completed_at,
			labeling_status: parse_variant(&row.labeling_status)?,
			labeling_attempted_at: row.labeling_attempted_at,
			labeling_completed_at: row.labeling_completed_at,
			labeling_error: row.labeling_error,
			vector_id: row.vector_id,
		})
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct TaskListResponse {
	pub tasks: Vec<TaskResponse>,
	pub total: i64,
	pub page: u32,
	pub page_size: u32,
	pub total_pages: i64,
}

/// A task write plus whether its content changed in a way that requires a
/// fresh labeling run.
#[derive(Clone, Debug)]
pub struct TaskWrite {
	pub task: TaskResponse,
	pub relabel: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeleteTaskOutcome {
	Deactivated,
	Deleted,
}

impl NudgeService {
	pub async fn create_task(
		&self,
		user_id: Uuid,
		req: CreateTaskRequest,
	) -> ServiceResult<TaskWrite> {
		if req.title.trim().is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "Title must be non-empty.".to_string(),
			});
		}

		let now = OffsetDateTime::now_utc();
		let status = req.status.unwrap_or(TaskStatus::Todo);
		let row = TaskRow {
			task_id: Uuid::new_v4(),
			user_id,
			title: req.title,
			description: req.description,
			status: status.as_str().to_string(),
			priority: req.priority.unwrap_or(TaskPriority::Medium).as_str().to_string(),
			is_active: true,
			created_at: now,
			updated_at: now,
			due_date: req.due_date,
			completed_at: (status == TaskStatus::Completed).then_some(now),
			labeling_status: LabelingStatus::Pending.as_str().to_string(),
			labeling_attempted_at: None,
			labeling_completed_at: None,
			labeling_error: None,
			vector_id: None,
			embedding_model: None,
			embedding_version: None,
		};

		queries::insert_task(&self.db, &row).await?;

		Ok(TaskWrite { task: TaskResponse::try_from_row(row)?, relabel: true })
	}

	pub async fn get_task(&self, user_id: Uuid, task_id: Uuid) -> ServiceResult<TaskResponse> {
		let row = self.fetch_task_row(user_id, task_id).await?;

		TaskResponse::try_from_row(row)
	}

	pub async fn list_tasks(
		&self,
		user_id: Uuid,
		req: TaskListRequest,
	) -> ServiceResult<TaskListResponse> {
		let page = req.page.max(1);
		let page_size = req.page_size.clamp(1, MAX_PAGE_SIZE);
		let filter = TaskListFilter {
			status: req.status.map(|status| status.as_str().to_string()),
			priority: req.priority.map(|priority| priority.as_str().to_string()),
			is_active: req.is_active,
			search: req.search.filter(|search| !search.trim().is_empty()),
			offset: i64::from(page - 1) * i64::from(page_size),
			limit: i64::from(page_size),
		};
		let (rows, total) = queries::list_tasks(&self.db, user_id, &filter).await?;
		let tasks =
			rows.into_iter().map(TaskResponse::try_from_row).collect::<ServiceResult<Vec<_>>>()?;
		let total_pages = (total + i64::from(page_size) - 1) / i64::from(page_size);

		Ok(TaskListResponse { tasks, total, page, page_size, total_pages })
	}

	/// Applies a partial update. Edits to title, description, priority, or
	/// due date flag the task for re-labeling; status flips maintain
	/// `completed_at`.
	pub async fn update_task(
		&self,
		user_id: Uuid,
		task_id: Uuid,
		req: UpdateTaskRequest,
	) -> ServiceResult<TaskWrite> {
		let mut row = self.fetch_task_row(user_id, task_id).await?;
		let now = OffsetDateTime::now_utc();
		let content_changed = req.title.is_some()
			|| req.description.is_some()
			|| req.priority.is_some()
			|| req.due_date.is_some();

		if let Some(title) = req.title {
			if title.trim().is_empty() {
				return Err(ServiceError::InvalidRequest {
					message: "Title must be non-empty.".to_string(),
				});
			}

			row.title = title;
		}
		if let Some(description) = req.description {
			row.description = Some(description);
		}
		if let Some(priority) = req.priority {
			row.priority = priority.as_str().to_string();
		}
		if let Some(due_date) = req.due_date {
			row.due_date = Some(due_date);
		}
		if let Some(status) = req.status {
			let was_completed = row.status == TaskStatus::Completed.as_str();

			if status == TaskStatus::Completed {
				if !was_completed {
					row.completed_at = Some(now);
				}
			} else {
				row.completed_at = None;
			}

			row.status = status.as_str().to_string();
		}

		row.updated_at = now;

		queries::update_task_content(&self.db, &row).await?;

		Ok(TaskWrite { task: TaskResponse::try_from_row(row)?, relabel: content_changed })
	}

	/// Soft delete by default; a hard delete removes the row (labels cascade)
	/// and then clears the vector point best-effort.
	pub async fn delete_task(
		&self,
		user_id: Uuid,
		task_id: Uuid,
		hard_delete: bool,
	) -> ServiceResult<DeleteTaskOutcome> {
		let now = OffsetDateTime::now_utc();

		if !hard_delete {
			if !queries::deactivate_task(&self.db, user_id, task_id, now).await? {
				return Err(ServiceError::NotFound { what: format!("task {task_id}") });
			}

			return Ok(DeleteTaskOutcome::Deactivated);
		}

		let row = self.fetch_task_row(user_id, task_id).await?;

		if !queries::delete_task(&self.db, user_id, task_id).await? {
			return Err(ServiceError::NotFound { what: format!("task {task_id}") });
		}
		if let Some(vector_id) = row.vector_id
			&& let Err(err) = self.vectors.delete_points(&[vector_id]).await
		{
			tracing::warn!(error = %err, %task_id, "Failed to delete task vector point.");
		}

		Ok(DeleteTaskOutcome::Deleted)
	}

	pub(crate) async fn fetch_task_row(
		&self,
		user_id: Uuid,
		task_id: Uuid,
	) -> ServiceResult<TaskRow> {
		queries::fetch_task(&self.db, user_id, task_id)
			.await?
			.ok_or_else(|| ServiceError::NotFound { what: format!("task {task_id}") })
	}
}

fn parse_variant<T>(raw: &str) -> ServiceResult<T>
where
	T: std::str::FromStr<Err = UnknownVariant>,
{
	raw.parse().map_err(|err: UnknownVariant| ServiceError::Storage { message: err.to_string() })
}

fn default_page() -> u32 {
	1
}

fn default_page_size() -> u32 {
	10
}

fn default_is_active() -> Option<bool> {
	Some(true)
}
