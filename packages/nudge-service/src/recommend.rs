use std::{cmp::Ordering, collections::HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{NudgeService, ServiceError, ServiceResult, prompts};
use nudge_domain::{
	scoring::{ExtractedContext, LabelSignal, MatchScore, score_labels},
	task::TaskPriority,
};
use nudge_storage::{models::TaskRow, queries};

const JUSTIFICATION_TEMPERATURE: f32 = 0.7;
const JUSTIFICATION_MAX_TOKENS: u32 = 100;
const SUGGESTION_TEMPERATURE: f32 = 0.7;
const SUGGESTION_MAX_TOKENS: u32 = 600;
const SUMMARY_TEMPERATURE: f32 = 0.8;
const SUMMARY_MAX_TOKENS: u32 = 150;

const NO_MATCH_MESSAGE: &str = "I couldn't find any tasks that match your current context. \
Try describing your situation differently, or add more tasks to your list!";

#[derive(Clone, Debug, Deserialize)]
pub struct RecommendRequest {
	pub message: String,
	pub top_k: Option<u32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TaskRecommendation {
	pub task_id: Uuid,
	pub title: String,
	pub description: Option<String>,
	pub priority: TaskPriority,
	pub match_score: f32,
	pub matching_labels: Vec<String>,
	pub reasoning: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TaskSuggestion {
	pub title: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default = "default_suggestion_priority")]
	pub priority: TaskPriority,
	pub rationale: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RecommendResponse {
	pub context: ExtractedContext,
	pub recommendations: Vec<TaskRecommendation>,
	pub suggestions: Vec<TaskSuggestion>,
	pub message: String,
}

#[derive(Debug, Deserialize)]
struct SuggestionBatch {
	suggestions: Vec<TaskSuggestion>,
}

pub(crate) struct ScoredCandidate {
	pub(crate) task: TaskRow,
	pub(crate) result: MatchScore,
}

impl NudgeService {
	/// Ranks the user's open tasks against their described situation. The
	/// response always returns: extraction, justification, suggestions, and
	/// the summary each degrade independently instead of failing the call.
	pub async fn recommend(
		&self,
		user_id: Uuid,
		req: RecommendRequest,
	) -> ServiceResult<RecommendResponse> {
		if req.message.trim().is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "Message must be non-empty.".to_string(),
			});
		}

		let top_k = req
			.top_k
			.unwrap_or(self.cfg.recommendation.default_top_k)
			.clamp(1, self.cfg.recommendation.max_top_k) as usize;
		let context = self.extract_context(&req.message).await;
		let candidates = queries::recommendation_candidates(&self.db, user_id).await?;
		let task_ids: Vec<Uuid> = candidates.iter().map(|task| task.task_id).collect();
		let labels = queries::labels_for_tasks(&self.db, &task_ids).await?;
		let mut signals_by_task: HashMap<Uuid, Vec<LabelSignal>> = HashMap::new();

		for label in labels {
			signals_by_task
				.entry(label.task_id)
				.or_default()
				.push(LabelSignal { name: label.name, confidence: label.confidence });
		}

		let mut scored = Vec::new();

		for task in candidates {
			// Unlabeled tasks cannot be scored and are skipped outright.
			let Some(signals) = signals_by_task.get(&task.task_id) else {
				continue;
			};
			let result = score_labels(signals, &context);

			if result.score > 0.0 {
				scored.push(ScoredCandidate { task, result });
			}
		}

		let top = select_top_candidates(scored, top_k);
		let mut recommendations = Vec::with_capacity(top.len());

		for candidate in top {
			let reasoning = self
				.justify_recommendation(
					&candidate.task.title,
					&context,
					&candidate.result.matching_labels,
				)
				.await;
			let priority: TaskPriority = candidate
				.task
				.priority
				.parse()
				.map_err(|err: nudge_domain::task::UnknownVariant| ServiceError::Storage {
					message: err.to_string(),
				})?;

			recommendations.push(TaskRecommendation {
				task_id: candidate.task.task_id,
				title: candidate.task.title,
				description: candidate.task.description,
				priority,
				match_score: candidate.result.score,
				matching_labels: candidate.result.matching_labels,
				reasoning,
			});
		}

		let suggestions = self.suggest_tasks(&req.message, &context).await;
		let message = if recommendations.is_empty() {
			NO_MATCH_MESSAGE.to_string()
		} else {
			self.summarize_recommendations(&req.message, &context, recommendations.len()).await
		};

		Ok(RecommendResponse { context, recommendations, suggestions, message })
	}

	async fn justify_recommendation(
		&self,
		title: &str,
		context: &ExtractedContext,
		matching_labels: &[String],
	) -> String {
		let prompt = prompts::justification_prompt(title, context, matching_labels);

		match self
			.providers
			.completion
			.complete(
				&self.cfg.providers.llm,
				prompts::assistant_system_prompt(),
				&prompt,
				JUSTIFICATION_TEMPERATURE,
				JUSTIFICATION_MAX_TOKENS,
			)
			.await
		{
			Ok(content) if !content.trim().is_empty() => content.trim().to_string(),
			Ok(_) => fallback_justification(matching_labels),
			Err(err) => {
				tracing::warn!(error = %err, "Justification call failed. Using template.");

				fallback_justification(matching_labels)
			},
		}
	}

	async fn suggest_tasks(
		&self,
		message: &str,
		context: &ExtractedContext,
	) -> Vec<TaskSuggestion> {
		let max_suggestions = self.cfg.recommendation.max_suggestions;

		if max_suggestions == 0 {
			return Vec::new();
		}

		let prompt = prompts::suggestion_user_prompt(message, context, max_suggestions);

		match self
			.providers
			.completion
			.complete(
				&self.cfg.providers.llm,
				prompts::suggestion_system_prompt(),
				&prompt,
				SUGGESTION_TEMPERATURE,
				SUGGESTION_MAX_TOKENS,
			)
			.await
		{
			Ok(content) => decode_suggestions(&content, max_suggestions as usize),
			Err(err) => {
				tracing::warn!(error = %err, "Suggestion call failed. Returning none.");

				Vec::new()
			},
		}
	}

	async fn summarize_recommendations(
		&self,
		message: &str,
		context: &ExtractedContext,
		count: usize,
	) -> String {
		let prompt = prompts::summary_prompt(message, context, count);

		match self
			.providers
			.completion
			.complete(
				&self.cfg.providers.llm,
				prompts::assistant_system_prompt(),
				&prompt,
				SUMMARY_TEMPERATURE,
				SUMMARY_MAX_TOKENS,
			)
			.await
		{
			Ok(content) if !content.trim().is_empty() => content.trim().to_string(),
			Ok(_) => fallback_summary(count),
			Err(err) => {
				tracing::warn!(error = %err, "Summary call failed. Using template.");

				fallback_summary(count)
			},
		}
	}
}

/// Stable descending sort, then the first `top_k`. Stability keeps
/// equal-score candidates in their original (creation) order.
pub(crate) fn select_top_candidates(
	mut scored: Vec<ScoredCandidate>,
	top_k: usize,
) -> Vec<ScoredCandidate> {
	scored.sort_by(|a, b| {
		b.result.score.partial_cmp(&a.result.score).unwrap_or(Ordering::Equal)
	});
	scored.truncate(top_k);

	scored
}

pub(crate) fn decode_suggestions(content: &str, max_suggestions: usize) -> Vec<TaskSuggestion> {
	match serde_json::from_str::<SuggestionBatch>(content.trim()) {
		Ok(batch) => {
			let mut suggestions = batch.suggestions;

			suggestions.truncate(max_suggestions);

			suggestions
		},
		Err(err) => {
			tracing::warn!(error = %err, "Suggestion payload failed to decode. Returning none.");

			Vec::new()
		},
	}
}

fn default_suggestion_priority() -> TaskPriority {
	TaskPriority::Medium
}

fn fallback_justification(matching_labels: &[String]) -> String {
	format!("This task matches your context with labels: {}", matching_labels.join(", "))
}

fn fallback_summary(count: usize) -> String {
	format!(
		"Based on how you're feeling, I found {count} task(s) that might be perfect for you \
right now!"
	)
}
