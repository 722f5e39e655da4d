use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{NudgeService, ServiceError, ServiceResult, prompts, truncate_chars};
use nudge_domain::{
	ranking::{RankedLabel, rank_by_confidence},
	taxonomy::{self, LabelBatch},
};
use nudge_storage::{
	models::{TaskLabelRow, TaskRow},
	queries,
};

const LABELING_TEMPERATURE: f32 = 0.7;
const LABELING_MAX_TOKENS: u32 = 2_000;

/// Optional caller-supplied situation forwarded into the labeling prompt.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct LabelingContext {
	pub timezone: Option<String>,
	pub location: Option<String>,
	pub preferences: Option<Value>,
}

/// Secondary projection outcome, reported separately from the primary one so
/// callers can branch on each.
#[derive(Clone, Debug)]
pub enum EmbeddingOutcome {
	Synced { vector_id: String },
	Failed { warning: String },
}

/// Terminal report of one labeling run. `run_labeling` never returns an
/// error; every failure lands here and in the task's labeling fields.
#[derive(Clone, Debug)]
pub enum LabelingRun {
	Completed { labels: usize, embedding: EmbeddingOutcome },
	Failed { error: String },
	Skipped,
}

impl NudgeService {
	/// Executes one labeling run for a task. Safe to invoke concurrently for
	/// different tasks; concurrent runs for the same task are last-writer-wins
	/// at the atomic replace step. A task that vanished between dispatch and
	/// execution is a logged no-op.
	pub async fn run_labeling(
		&self,
		user_id: Uuid,
		task_id: Uuid,
		context: Option<LabelingContext>,
	) -> LabelingRun {
		let task = match queries::fetch_task(&self.db, user_id, task_id).await {
			Ok(Some(task)) => task,
			Ok(None) => {
				tracing::info!(%task_id, "Task missing at labeling time. Skipping run.");

				return LabelingRun::Skipped;
			},
			Err(err) => {
				tracing::error!(error = %err, %task_id, "Failed to load task for labeling.");

				return LabelingRun::Failed { error: err.to_string() };
			},
		};
		let attempted_at = OffsetDateTime::now_utc();

		// Persist `in_progress` before the slow call so the status is
		// externally observable while the collaborator works.
		if let Err(err) =
			queries::mark_labeling_in_progress(&self.db, user_id, task_id, attempted_at).await
		{
			tracing::error!(error = %err, %task_id, "Failed to mark labeling in progress.");

			return LabelingRun::Failed { error: err.to_string() };
		}

		match self.execute_labeling(&task, context.as_ref(), attempted_at).await {
			Ok((labels, embedding)) => {
				tracing::info!(%task_id, labels, "Labeling run completed.");

				LabelingRun::Completed { labels, embedding }
			},
			Err(err) => {
				let error = truncate_chars(
					&err.to_string(),
					self.cfg.labeling.max_error_chars as usize,
				);

				tracing::error!(%task_id, error = %error, "Labeling run failed.");

				if let Err(mark_err) = queries::mark_labeling_failed(
					&self.db,
					user_id,
					task_id,
					&error,
					OffsetDateTime::now_utc(),
				)
				.await
				{
					tracing::error!(error = %mark_err, %task_id, "Failed to record labeling failure.");
				}

				LabelingRun::Failed { error }
			},
		}
	}

	async fn execute_labeling(
		&self,
		task: &TaskRow,
		context: Option<&LabelingContext>,
		now: OffsetDateTime,
	) -> ServiceResult<(usize, EmbeddingOutcome)> {
		let user_prompt = prompts::labeling_user_prompt(task, context, now);
		let content = self
			.providers
			.completion
			.complete(
				&self.cfg.providers.llm,
				prompts::labeling_system_prompt(),
				&user_prompt,
				LABELING_TEMPERATURE,
				LABELING_MAX_TOKENS,
			)
			.await?;
		let mut batch = decode_label_batch(&content)?;

		for label in &mut batch.labels {
			label.name = taxonomy::normalize_name(&label.name);
		}

		taxonomy::validate_batch(
			&batch.labels,
			self.cfg.labeling.min_labels as usize,
			self.cfg.labeling.min_categories as usize,
		)
		.map_err(|violation| ServiceError::Validation { message: violation.to_string() })?;

		let ranked =
			rank_by_confidence(batch.labels, self.cfg.labeling.primary_count as usize);
		let metadata = serde_json::json!({
			"summary": batch.summary,
			"external_factors": batch.external_factors_considered,
		});

		self.replace_task_labels(task.task_id, &ranked, &metadata).await?;

		// Labeling success and embedding success are independent outcomes: a
		// sync failure is annotated as a warning and never reverts `completed`.
		let embedding = match self.sync_task_embedding(task, &ranked).await {
			Ok(vector_id) => EmbeddingOutcome::Synced { vector_id },
			Err(err) => {
				let warning = truncate_chars(
					&format!("Labels stored but embedding sync failed: {err}"),
					self.cfg.labeling.max_warning_chars as usize,
				);

				tracing::warn!(task_id = %task.task_id, warning = %warning, "Embedding sync failed.");

				if let Err(annotate_err) = queries::annotate_labeling_warning(
					&self.db,
					task.task_id,
					&warning,
					OffsetDateTime::now_utc(),
				)
				.await
				{
					tracing::error!(
						error = %annotate_err,
						task_id = %task.task_id,
						"Failed to annotate embedding warning.",
					);
				}

				EmbeddingOutcome::Failed { warning }
			},
		};

		Ok((ranked.len(), embedding))
	}

	/// Atomically replaces the task's label set and flips the run to
	/// `completed`: one transaction, so concurrent readers never observe a
	/// partial batch.
	async fn replace_task_labels(
		&self,
		task_id: Uuid,
		ranked: &[RankedLabel],
		metadata: &Value,
	) -> ServiceResult<()> {
		let base_now = OffsetDateTime::now_utc();
		let mut tx = self.db.pool.begin().await?;

		queries::delete_task_labels_tx(&mut tx, task_id).await?;

		for (index, entry) in ranked.iter().enumerate() {
			// Stagger timestamps so retrieval keeps the ranked order even
			// across equal confidences.
			let now = base_now + Duration::microseconds(index as i64);
			let row = TaskLabelRow {
				label_id: Uuid::new_v4(),
				task_id,
				name: entry.label.name.clone(),
				category: entry.label.category.as_str().to_string(),
				confidence: entry.label.confidence,
				is_primary: entry.is_primary,
				is_user_edited: false,
				original_name: None,
				reasoning: Some(entry.label.reasoning.clone()),
				metadata: metadata.clone(),
				created_at: now,
				updated_at: now,
			};

			queries::insert_task_label_tx(&mut tx, &row).await?;
		}

		queries::mark_labeling_completed_tx(&mut tx, task_id, base_now).await?;

		tx.commit().await?;

		Ok(())
	}
}

/// Strict decode of the collaborator's structured output; any schema
/// violation fails the run rather than salvaging fields.
fn decode_label_batch(content: &str) -> ServiceResult<LabelBatch> {
	serde_json::from_str(content.trim()).map_err(|err| ServiceError::Validation {
		message: format!("Label batch failed to decode: {err}."),
	})
}
