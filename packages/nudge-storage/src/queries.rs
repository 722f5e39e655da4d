use sqlx::{Postgres, QueryBuilder, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	db::Db,
	models::{TaskLabelRow, TaskRow},
};

pub struct TaskListFilter {
	pub status: Option<String>,
	pub priority: Option<String>,
	pub is_active: Option<bool>,
	pub search: Option<String>,
	pub offset: i64,
	pub limit: i64,
}

pub async fn insert_task(db: &Db, task: &TaskRow) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO tasks (
	task_id,
	user_id,
	title,
	description,
	status,
	priority,
	is_active,
	created_at,
	updated_at,
	due_date,
	completed_at,
	labeling_status,
	labeling_attempted_at,
	labeling_completed_at,
	labeling_error,
	vector_id,
	embedding_model,
	embedding_version
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
	)
	.bind(task.task_id)
	.bind(task.user_id)
	.bind(task.title.as_str())
	.bind(task.description.as_deref())
	.bind(task.status.as_str())
	.bind(task.priority.as_str())
	.bind(task.is_active)
	.bind(task.created_at)
	.bind(task.updated_at)
	.bind(task.due_date)
	.bind(task.completed_at)
	.bind(task.labeling_status.as_str())
	.bind(task.labeling_attempted_at)
	.bind(task.labeling_completed_at)
	.bind(task.labeling_error.as_deref())
	.bind(task.vector_id.as_deref())
	.bind(task.embedding_model.as_deref())
	.bind(task.embedding_version.as_deref())
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn fetch_task(db: &Db, user_id: Uuid, task_id: Uuid) -> Result<Option<TaskRow>> {
	let task = sqlx::query_as::<_, TaskRow>(
		"SELECT * FROM tasks WHERE task_id = $1 AND user_id = $2",
	)
	.bind(task_id)
	.bind(user_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(task)
}

pub async fn update_task_content(db: &Db, task: &TaskRow) -> Result<()> {
	sqlx::query(
		"\
UPDATE tasks
SET
	title = $1,
	description = $2,
	status = $3,
	priority = $4,
	is_active = $5,
	due_date = $6,
	completed_at = $7,
	updated_at = $8
WHERE task_id = $9 AND user_id = $10",
	)
	.bind(task.title.as_str())
	.bind(task.description.as_deref())
	.bind(task.status.as_str())
	.bind(task.priority.as_str())
	.bind(task.is_active)
	.bind(task.due_date)
	.bind(task.completed_at)
	.bind(task.updated_at)
	.bind(task.task_id)
	.bind(task.user_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn list_tasks(
	db: &Db,
	user_id: Uuid,
	filter: &TaskListFilter,
) -> Result<(Vec<TaskRow>, i64)> {
	let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM tasks WHERE user_id = ");

	builder.push_bind(user_id);
	push_task_filters(&mut builder, filter);
	builder.push(" ORDER BY created_at DESC LIMIT ");
	builder.push_bind(filter.limit);
	builder.push(" OFFSET ");
	builder.push_bind(filter.offset);

	let tasks = builder.build_query_as::<TaskRow>().fetch_all(&db.pool).await?;
	let mut count_builder =
		QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks WHERE user_id = ");

	count_builder.push_bind(user_id);
	push_task_filters(&mut count_builder, filter);

	let total: i64 = count_builder.build_query_scalar().fetch_one(&db.pool).await?;

	Ok((tasks, total))
}

fn push_task_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &TaskListFilter) {
	if let Some(status) = filter.status.as_deref() {
		builder.push(" AND status = ");
		builder.push_bind(status.to_string());
	}
	if let Some(priority) = filter.priority.as_deref() {
		builder.push(" AND priority = ");
		builder.push_bind(priority.to_string());
	}
	if let Some(is_active) = filter.is_active {
		builder.push(" AND is_active = ");
		builder.push_bind(is_active);
	}
	if let Some(search) = filter.search.as_deref() {
		let pattern = format!("%{search}%");

		builder.push(" AND (title ILIKE ");
		builder.push_bind(pattern.clone());
		builder.push(" OR description ILIKE ");
		builder.push_bind(pattern);
		builder.push(")");
	}
}

pub async fn deactivate_task(db: &Db, user_id: Uuid, task_id: Uuid, now: OffsetDateTime) -> Result<bool> {
	let result = sqlx::query(
		"UPDATE tasks SET is_active = FALSE, updated_at = $1 WHERE task_id = $2 AND user_id = $3",
	)
	.bind(now)
	.bind(task_id)
	.bind(user_id)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn delete_task(db: &Db, user_id: Uuid, task_id: Uuid) -> Result<bool> {
	let result = sqlx::query("DELETE FROM tasks WHERE task_id = $1 AND user_id = $2")
		.bind(task_id)
		.bind(user_id)
		.execute(&db.pool)
		.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn mark_labeling_in_progress(
	db: &Db,
	user_id: Uuid,
	task_id: Uuid,
	attempted_at: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
UPDATE tasks
SET
	labeling_status = 'in_progress',
	labeling_attempted_at = $1,
	updated_at = $1
WHERE task_id = $2 AND user_id = $3",
	)
	.bind(attempted_at)
	.bind(task_id)
	.bind(user_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn mark_labeling_failed(
	db: &Db,
	user_id: Uuid,
	task_id: Uuid,
	error: &str,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
UPDATE tasks
SET
	labeling_status = 'failed',
	labeling_error = $1,
	updated_at = $2
WHERE task_id = $3 AND user_id = $4",
	)
	.bind(error)
	.bind(now)
	.bind(task_id)
	.bind(user_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Attaches a post-completion warning without touching `labeling_status`.
pub async fn annotate_labeling_warning(
	db: &Db,
	task_id: Uuid,
	warning: &str,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query("UPDATE tasks SET labeling_error = $1, updated_at = $2 WHERE task_id = $3")
		.bind(warning)
		.bind(now)
		.bind(task_id)
		.execute(&db.pool)
		.await?;

	Ok(())
}

pub async fn delete_task_labels_tx(
	tx: &mut Transaction<'_, Postgres>,
	task_id: Uuid,
) -> Result<()> {
	sqlx::query("DELETE FROM task_labels WHERE task_id = $1")
		.bind(task_id)
		.execute(&mut **tx)
		.await?;

	Ok(())
}

pub async fn insert_task_label_tx(
	tx: &mut Transaction<'_, Postgres>,
	label: &TaskLabelRow,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO task_labels (
	label_id,
	task_id,
	name,
	category,
	confidence,
	is_primary,
	is_user_edited,
	original_name,
	reasoning,
	metadata,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
	)
	.bind(label.label_id)
	.bind(label.task_id)
	.bind(label.name.as_str())
	.bind(label.category.as_str())
	.bind(label.confidence)
	.bind(label.is_primary)
	.bind(label.is_user_edited)
	.bind(label.original_name.as_deref())
	.bind(label.reasoning.as_deref())
	.bind(&label.metadata)
	.bind(label.created_at)
	.bind(label.updated_at)
	.execute(&mut **tx)
	.await?;

	Ok(())
}

pub async fn mark_labeling_completed_tx(
	tx: &mut Transaction<'_, Postgres>,
	task_id: Uuid,
	completed_at: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
UPDATE tasks
SET
	labeling_status = 'completed',
	labeling_completed_at = $1,
	labeling_error = NULL,
	updated_at = $1
WHERE task_id = $2",
	)
	.bind(completed_at)
	.bind(task_id)
	.execute(&mut **tx)
	.await?;

	Ok(())
}

pub async fn set_task_embedding(
	db: &Db,
	task_id: Uuid,
	vector_id: &str,
	embedding_model: &str,
	embedding_version: &str,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
UPDATE tasks
SET
	vector_id = $1,
	embedding_model = $2,
	embedding_version = $3,
	updated_at = $4
WHERE task_id = $5",
	)
	.bind(vector_id)
	.bind(embedding_model)
	.bind(embedding_version)
	.bind(now)
	.bind(task_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn labels_for_task(
	db: &Db,
	user_id: Uuid,
	task_id: Uuid,
	primary_only: bool,
) -> Result<Vec<TaskLabelRow>> {
	let mut builder = QueryBuilder::<Postgres>::new(
		"\
SELECT task_labels.*
FROM task_labels
JOIN tasks ON tasks.task_id = task_labels.task_id
WHERE task_labels.task_id = ",
	);

	builder.push_bind(task_id);
	builder.push(" AND tasks.user_id = ");
	builder.push_bind(user_id);

	if primary_only {
		builder.push(" AND task_labels.is_primary = TRUE");
	}

	builder.push(" ORDER BY task_labels.confidence DESC, task_labels.created_at ASC");

	let labels = builder.build_query_as::<TaskLabelRow>().fetch_all(&db.pool).await?;

	Ok(labels)
}

pub async fn fetch_label(db: &Db, user_id: Uuid, label_id: Uuid) -> Result<Option<TaskLabelRow>> {
	let label = sqlx::query_as::<_, TaskLabelRow>(
		"\
SELECT task_labels.*
FROM task_labels
JOIN tasks ON tasks.task_id = task_labels.task_id
WHERE task_labels.label_id = $1 AND tasks.user_id = $2",
	)
	.bind(label_id)
	.bind(user_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(label)
}

pub async fn update_label(db: &Db, label: &TaskLabelRow) -> Result<()> {
	sqlx::query(
		"\
UPDATE task_labels
SET
	name = $1,
	category = $2,
	confidence = $3,
	is_primary = $4,
	is_user_edited = $5,
	original_name = $6,
	reasoning = $7,
	updated_at = $8
WHERE label_id = $9",
	)
	.bind(label.name.as_str())
	.bind(label.category.as_str())
	.bind(label.confidence)
	.bind(label.is_primary)
	.bind(label.is_user_edited)
	.bind(label.original_name.as_deref())
	.bind(label.reasoning.as_deref())
	.bind(label.updated_at)
	.bind(label.label_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn delete_label(db: &Db, user_id: Uuid, label_id: Uuid) -> Result<bool> {
	let result = sqlx::query(
		"\
DELETE FROM task_labels
USING tasks
WHERE task_labels.label_id = $1
	AND tasks.task_id = task_labels.task_id
	AND tasks.user_id = $2",
	)
	.bind(label_id)
	.bind(user_id)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() > 0)
}

/// Active, not-yet-completed tasks eligible for recommendation scoring.
pub async fn recommendation_candidates(db: &Db, user_id: Uuid) -> Result<Vec<TaskRow>> {
	let tasks = sqlx::query_as::<_, TaskRow>(
		"\
SELECT *
FROM tasks
WHERE user_id = $1
	AND is_active = TRUE
	AND status <> 'completed'
ORDER BY created_at ASC",
	)
	.bind(user_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(tasks)
}

pub async fn labels_for_tasks(db: &Db, task_ids: &[Uuid]) -> Result<Vec<TaskLabelRow>> {
	if task_ids.is_empty() {
		return Ok(Vec::new());
	}

	let labels = sqlx::query_as::<_, TaskLabelRow>(
		"\
SELECT *
FROM task_labels
WHERE task_id = ANY($1)
ORDER BY confidence DESC, created_at ASC",
	)
	.bind(task_ids)
	.fetch_all(&db.pool)
	.await?;

	Ok(labels)
}
