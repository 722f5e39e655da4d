use std::{collections::BTreeMap, time::Duration};

use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::{NudgeService, ServiceError, ServiceResult};
use nudge_domain::ranking::RankedLabel;
use nudge_storage::{models::TaskRow, queries};

const EMBED_MAX_ATTEMPTS: u32 = 3;
const EMBED_BACKOFF_BASE_SECS: u64 = 2;
const EMBED_BACKOFF_CAP_SECS: u64 = 10;
const EMBEDDING_VERSION: &str = "v1";
/// Labels at or above this confidence are listed separately in the vector
/// payload for filtering.
const HIGH_CONFIDENCE_THRESHOLD: f32 = 0.7;

impl NudgeService {
	/// Projects a freshly labeled task into the vector store. Failure here
	/// propagates to the labeling run, which downgrades it to a warning.
	pub(crate) async fn sync_task_embedding(
		&self,
		task: &TaskRow,
		labels: &[RankedLabel],
	) -> ServiceResult<String> {
		let text = build_task_text(task, labels);
		let vector = self.embed_with_retry(&text).await?;

		if vector.len() != self.vectors.vector_dim as usize {
			return Err(ServiceError::Provider {
				message: format!(
					"Embedding dimension {} does not match configured vector_dim {}.",
					vector.len(),
					self.vectors.vector_dim
				),
			});
		}

		// The vector id is generated once per task and reused on updates.
		let vector_id =
			task.vector_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
		let payload = build_vector_payload(task, labels);

		self.vectors.ensure_collection().await?;
		self.vectors.upsert_task(&vector_id, vector, payload).await?;

		queries::set_task_embedding(
			&self.db,
			task.task_id,
			&vector_id,
			&self.cfg.providers.embedding.model,
			EMBEDDING_VERSION,
			OffsetDateTime::now_utc(),
		)
		.await?;

		Ok(vector_id)
	}

	async fn embed_with_retry(&self, text: &str) -> ServiceResult<Vec<f32>> {
		let mut last_error = None;

		for attempt in 1..=EMBED_MAX_ATTEMPTS {
			match self.providers.embedding.embed(&self.cfg.providers.embedding, text).await {
				Ok(vector) => return Ok(vector),
				Err(err) => {
					tracing::warn!(attempt, error = %err, "Embedding attempt failed.");

					last_error = Some(err);
				},
			}

			if attempt < EMBED_MAX_ATTEMPTS {
				tokio::time::sleep(backoff_for_attempt(attempt)).await;
			}
		}

		Err(ServiceError::Provider {
			message: format!(
				"Embedding failed after {EMBED_MAX_ATTEMPTS} attempts: {}",
				last_error.map(|err| err.to_string()).unwrap_or_default()
			),
		})
	}
}

fn backoff_for_attempt(attempt: u32) -> Duration {
	let exp = attempt.saturating_sub(1).min(6);
	let secs = EMBED_BACKOFF_BASE_SECS.saturating_mul(1 << exp).min(EMBED_BACKOFF_CAP_SECS);

	Duration::from_secs(secs)
}

/// Canonical text representation of a labeled task, fed to the embedding
/// collaborator.
fn build_task_text(task: &TaskRow, labels: &[RankedLabel]) -> String {
	let mut parts = vec![format!("Title: {}", task.title)];

	if let Some(description) = task.description.as_deref() {
		parts.push(format!("Description: {description}"));
	}

	parts.push(format!("Priority: {}", task.priority));
	parts.push(format!("Status: {}", task.status));

	if let Some(due_date) = task.due_date
		&& let Ok(formatted) = due_date.format(&Rfc3339)
	{
		parts.push(format!("Due: {formatted}"));
	}
	if !labels.is_empty() {
		let label_texts: Vec<String> = labels
			.iter()
			.map(|entry| format!("{} ({})", entry.label.name, entry.label.category))
			.collect();

		parts.push(format!("Labels: {}", label_texts.join(", ")));
	}

	parts.join(" | ")
}

/// Metadata stored next to the vector: label names grouped by category plus
/// the high-confidence names, so vector hits can be filtered without a
/// relational round trip.
fn build_vector_payload(task: &TaskRow, labels: &[RankedLabel]) -> Value {
	let mut by_category: BTreeMap<String, Vec<String>> = BTreeMap::new();
	let mut high_confidence = Vec::new();

	for entry in labels {
		by_category
			.entry(entry.label.category.as_str().to_string())
			.or_default()
			.push(entry.label.name.clone());

		if entry.label.confidence >= HIGH_CONFIDENCE_THRESHOLD {
			high_confidence.push(entry.label.name.clone());
		}
	}

	let mut payload = serde_json::json!({
		"task_id": task.task_id,
		"user_id": task.user_id,
		"title": task.title,
		"priority": task.priority,
		"status": task.status,
		"labels": by_category,
		"high_confidence_labels": high_confidence,
	});

	if let Some(due_date) = task.due_date
		&& let Ok(formatted) = due_date.format(&Rfc3339)
	{
		payload["due_date"] = Value::String(formatted);
	}
	if let Some(description) = task.description.as_deref() {
		payload["description"] = Value::String(crate::truncate_chars(description, 500));
	}

	payload
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;
	use nudge_domain::taxonomy::{GeneratedLabel, LabelCategory};

	fn ranked(name: &str, category: LabelCategory, confidence: f32) -> RankedLabel {
		RankedLabel {
			label: GeneratedLabel {
				name: name.to_string(),
				category,
				confidence,
				reasoning: String::new(),
			},
			is_primary: false,
		}
	}

	fn task() -> TaskRow {
		let now = datetime!(2024-03-10 18:30 UTC);

		TaskRow {
			task_id: Uuid::new_v4(),
			user_id: Uuid::new_v4(),
			title: "Book dentist appointment".to_string(),
			description: Some("Ask about the molar.".to_string()),
			status: "todo".to_string(),
			priority: "high".to_string(),
			is_active: true,
			created_at: now,
			updated_at: now,
			due_date: Some(datetime!(2024-03-15 09:00 UTC)),
			completed_at: None,
			labeling_status: "completed".to_string(),
			labeling_attempted_at: None,
			labeling_completed_at: None,
			labeling_error: None,
			vector_id: None,
			embedding_model: None,
			embedding_version: None,
		}
	}

	#[test]
	fn task_text_concatenates_all_sections() {
		let labels = vec![
			ranked("phone", LabelCategory::Tools, 0.9),
			ranked("quick-5min", LabelCategory::Duration, 0.8),
		];
		let text = build_task_text(&task(), &labels);

		assert_eq!(
			text,
			"Title: Book dentist appointment | Description: Ask about the molar. | \
Priority: high | Status: todo | Due: 2024-03-15T09:00:00Z | \
Labels: phone (tools), quick-5min (duration)"
		);
	}

	#[test]
	fn payload_groups_labels_and_filters_high_confidence() {
		let labels = vec![
			ranked("phone", LabelCategory::Tools, 0.9),
			ranked("laptop", LabelCategory::Tools, 0.4),
			ranked("quick-5min", LabelCategory::Duration, 0.7),
		];
		let payload = build_vector_payload(&task(), &labels);

		assert_eq!(
			payload["labels"]["tools"],
			serde_json::json!(["phone", "laptop"])
		);
		assert_eq!(
			payload["high_confidence_labels"],
			serde_json::json!(["phone", "quick-5min"])
		);
		assert_eq!(payload["priority"], "high");
	}

	#[test]
	fn backoff_doubles_from_base_and_caps() {
		assert_eq!(backoff_for_attempt(1), Duration::from_secs(2));
		assert_eq!(backoff_for_attempt(2), Duration::from_secs(4));
		assert_eq!(backoff_for_attempt(3), Duration::from_secs(8));
		assert_eq!(backoff_for_attempt(4), Duration::from_secs(10));
	}
}
