use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{NudgeService, ServiceError, ServiceResult, time_serde};
use nudge_domain::{
	task::LabelingStatus,
	taxonomy::{self, LabelCategory},
};
use nudge_storage::{models::TaskLabelRow, queries};

#[derive(Clone, Debug, Serialize)]
pub struct LabelResponse {
	pub label_id: Uuid,
	pub task_id: Uuid,
	pub name: String,
	pub category: LabelCategory,
	pub confidence: f32,
	pub is_primary: bool,
	pub is_user_edited: bool,
	pub original_name: Option<String>,
	pub reasoning: Option<String>,
	pub metadata: Value,
	#[serde(with = "time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time_serde")]
	pub updated_at: OffsetDateTime,
}
impl LabelResponse {
	fn try_from_row(row: TaskLabelRow) -> ServiceResult<Self> {
		let category = row
			.category
			.parse()
			.map_err(|err: taxonomy::UnknownCategory| ServiceError::Storage {
				message: err.to_string(),
			})?;

		Ok(Self {
			label_id: row.label_id,
			task_id: row.task_id,
			name: row.name,
			category,
			confidence: row.confidence,
			is_primary: row.is_primary,
			is_user_edited: row.is_user_edited,
			original_name: row.original_name,
			reasoning: row.reasoning,
			metadata: row.metadata,
			created_at: row.created_at,
			updated_at: row.updated_at,
		})
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct LabelingStatusReport {
	pub task_id: Uuid,
	pub labeling_status: LabelingStatus,
	#[serde(with = "time_serde::option")]
	pub labeling_attempted_at: Option<OffsetDateTime>,
	#[serde(with = "time_serde::option")]
	pub labeling_completed_at: Option<OffsetDateTime>,
	pub labeling_error: Option<String>,
	pub labels_count: usize,
	pub primary_labels: Vec<LabelResponse>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateLabelRequest {
	pub name: Option<String>,
	pub category: Option<LabelCategory>,
	pub confidence: Option<f32>,
	pub is_primary: Option<bool>,
	pub reasoning: Option<String>,
}

impl NudgeService {
	pub async fn task_labels(
		&self,
		user_id: Uuid,
		task_id: Uuid,
		primary_only: bool,
	) -> ServiceResult<Vec<LabelResponse>> {
		self.fetch_task_row(user_id, task_id).await?;

		let rows = queries::labels_for_task(&self.db, user_id, task_id, primary_only).await?;

		rows.into_iter().map(LabelResponse::try_from_row).collect()
	}

	pub async fn labeling_status(
		&self,
		user_id: Uuid,
		task_id: Uuid,
	) -> ServiceResult<LabelingStatusReport> {
		let row = self.fetch_task_row(user_id, task_id).await?;
		let labels = queries::labels_for_task(&self.db, user_id, task_id, false).await?;
		let primary_labels = labels
			.iter()
			.filter(|label| label.is_primary)
			.cloned()
			.map(LabelResponse::try_from_row)
			.collect::<ServiceResult<Vec<_>>>()?;
		let labeling_status = row
			.labeling_status
			.parse()
			.map_err(|err: nudge_domain::task::UnknownVariant| ServiceError::Storage {
				message: err.to_string(),
			})?;

		Ok(LabelingStatusReport {
			task_id,
			labeling_status,
			labeling_attempted_at: row.labeling_attempted_at,
			labeling_completed_at: row.labeling_completed_at,
			labeling_error: row.labeling_error,
			labels_count: labels.len(),
			primary_labels,
		})
	}

	/// Applies a user edit to one label. The first edit snapshots the
	/// AI-generated name into `original_name`; once set it is never
	/// overwritten.
	pub async fn update_label(
		&self,
		user_id: Uuid,
		label_id: Uuid,
		req: UpdateLabelRequest,
	) -> ServiceResult<LabelResponse> {
		let mut row = queries::fetch_label(&self.db, user_id, label_id)
			.await?
			.ok_or_else(|| ServiceError::NotFound { what: format!("label {label_id}") })?;

		if let Some(confidence) = req.confidence
			&& !(0.0..=1.0).contains(&confidence)
		{
			return Err(ServiceError::InvalidRequest {
				message: "Confidence must be within [0, 1].".to_string(),
			});
		}
		if !row.is_user_edited {
			row.original_name = Some(row.name.clone());
			row.is_user_edited = true;
		}
		if let Some(name) = req.name {
			let normalized = taxonomy::normalize_name(&name);

			if normalized.is_empty() {
				return Err(ServiceError::InvalidRequest {
					message: "Label name must be non-empty.".to_string(),
				});
			}

			row.name = normalized;
		}
		if let Some(category) = req.category {
			row.category = category.as_str().to_string();
		}
		if let Some(confidence) = req.confidence {
			row.confidence = confidence;
		}
		if let Some(is_primary) = req.is_primary {
			row.is_primary = is_primary;
		}
		if let Some(reasoning) = req.reasoning {
			row.reasoning = Some(reasoning);
		}

		row.updated_at = OffsetDateTime::now_utc();

		queries::update_label(&self.db, &row).await?;

		LabelResponse::try_from_row(row)
	}

	pub async fn delete_label(&self, user_id: Uuid, label_id: Uuid) -> ServiceResult<()> {
		if !queries::delete_label(&self.db, user_id, label_id).await? {
			return Err(ServiceError::NotFound { what: format!("label {label_id}") });
		}

		Ok(())
	}
}
