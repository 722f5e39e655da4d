use time::{OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};

use crate::labeling::LabelingContext;
use nudge_domain::{
	clock::{DayPart, Urgency},
	scoring::ExtractedContext,
};
use nudge_storage::models::TaskRow;

pub(crate) fn labeling_system_prompt() -> &'static str {
	"You are an expert task labeling agent. Analyze the task and generate comprehensive, \
actionable labels that help the user decide when and where to complete it.

Label every relevant dimension:
- location: where the task should be done (home, office, outdoor, gym, store, cafe, anywhere)
- time: when it is best done (early-morning, morning, midday, afternoon, evening, night, late-night, weekday, weekend)
- energy: mental or physical energy required (high-energy, medium-energy, low-energy, minimal-energy)
- duration: how long it takes (quick-5min, short-15min, medium-30min, standard-1hr, long-2hr, extended-4hr+)
- mood: mental state needed (focused, creative, analytical, social, physical, administrative, reflective)
- category: task type (work, personal, health, shopping, errands, learning, entertainment, household)
- prerequisites: what is needed (internet, phone, computer, tools, other-people, transportation)
- context: environmental needs (quiet-needed, active, collaborative, solo, urgent, flexible)
- tools: specific tools needed (smartphone, laptop, pen-paper, specific-app, physical-tools, vehicle)
- people: social context (solo, with-family, with-friends, with-colleagues, service-provider)
- weather: weather dependency (indoor-only, outdoor-preferred, weather-dependent, any-weather)
- other: anything else relevant (batch-with-similar, deadline-driven, habit-building, recurring)

The category field MUST be one of exactly: location, time, energy, duration, mood, category, \
prerequisites, context, tools, people, weather, other.

Generate at least 6 labels spanning at least 3 categories, each with a confidence score \
between 0.0 and 1.0. Label names are lowercase and hyphenated.

Return ONLY valid JSON in this exact format:
{
  \"labels\": [
    {
      \"label_name\": \"string\",
      \"category\": \"string\",
      \"confidence\": 0.0,
      \"reasoning\": \"string\"
    }
  ],
  \"summary\": \"string\",
  \"external_factors_considered\": [\"string\"]
}"
}

pub(crate) fn labeling_user_prompt(
	task: &TaskRow,
	context: Option<&LabelingContext>,
	now: OffsetDateTime,
) -> String {
	let mut parts = vec!["**TASK TO LABEL:**".to_string(), format!("Title: {}", task.title)];

	if let Some(description) = task.description.as_deref() {
		parts.push(format!("Description: {description}"));
	}

	parts.push(format!("Priority: {}", task.priority));

	if let Some(due_date) = task.due_date {
		if let Ok(formatted) = due_date.format(&Rfc3339) {
			parts.push(format!("Due Date: {formatted}"));
		}
		if let Some(urgency) = Urgency::from_due_date(Some(due_date), now).describe() {
			parts.push(urgency);
		}
	}
	if let Some(context) = context {
		parts.push("\n**USER CONTEXT:**".to_string());

		if let Some(timezone) = context.timezone.as_deref() {
			parts.push(format!("Timezone: {timezone}"));
		}
		if let Some(location) = context.location.as_deref() {
			parts.push(format!("Location: {location}"));
		}
		if let Some(preferences) = context.preferences.as_ref() {
			parts.push(format!("Preferences: {preferences}"));
		}
	}

	let minute_format = format_description!("[year]-[month]-[day] [hour]:[minute]");
	let formatted_now = now.format(&minute_format).unwrap_or_default();

	parts.push("\n**CURRENT CONTEXT:**".to_string());
	parts.push(format!("Current Time (UTC): {formatted_now}"));
	parts.push(format!("Day of Week: {}", now.weekday()));
	parts.push(format!("Time of Day: {}", DayPart::of(now).as_str()));
	parts.push("\n**INSTRUCTIONS:**".to_string());
	parts.push(
		"Generate comprehensive labels that will help determine the best time and context to \
complete this task. Consider every external factor that might affect completion. Return ONLY \
valid JSON in the specified format."
			.to_string(),
	);

	parts.join("\n")
}

pub(crate) fn extraction_system_prompt() -> &'static str {
	"You are a context extraction assistant. Extract structured information from the user's \
message about their current state.

Identify:
- location: where they are (home, office, outdoor, gym, store, cafe, ...)
- time_of_day: current time context (early-morning, morning, afternoon, evening, night)
- energy_level: their energy level (high-energy, medium-energy, low-energy, minimal-energy)
- mood: their mental state (focused, creative, social, physical, reflective, motivated, ...)
- duration_available: how much time they have (quick-5min, short-15min, medium-30min, standard-1hr, long-2hr, extended-4hr+)
- other_labels: any other relevant context (quiet-needed, collaborative, solo, urgent, ...)

Return ONLY valid JSON in this format:
{
  \"location\": \"string or null\",
  \"time_of_day\": \"string or null\",
  \"energy_level\": \"string or null\",
  \"mood\": \"string or null\",
  \"duration_available\": \"string or null\",
  \"other_labels\": [\"string\"]
}

Use lowercase and hyphens for all labels. If something is not mentioned and cannot be \
inferred, use null."
}

pub(crate) fn extraction_user_prompt(message: &str) -> String {
	format!("Extract context from this message:\n\n\"{message}\"\n\nReturn the structured context as JSON.")
}

pub(crate) fn assistant_system_prompt() -> &'static str {
	"You are a friendly task assistant helping the user decide what to work on."
}

pub(crate) fn justification_prompt(
	title: &str,
	context: &ExtractedContext,
	matching_labels: &[String],
) -> String {
	let context_json = serde_json::to_string(context).unwrap_or_default();

	format!(
		"Explain in one sentence why this task is a good match for the user's current situation.\n\n\
Task: {title}\n\
User Context: {context_json}\n\
Matching Labels: {}\n\n\
Write a brief, friendly explanation.",
		matching_labels.join(", ")
	)
}

pub(crate) fn suggestion_system_prompt() -> &'static str {
	"You suggest new tasks that fit the user's current situation. Return ONLY valid JSON in \
this format:
{
  \"suggestions\": [
    {
      \"title\": \"string\",
      \"description\": \"string or null\",
      \"priority\": \"low | medium | high | urgent\",
      \"rationale\": \"string (one sentence)\"
    }
  ]
}"
}

pub(crate) fn suggestion_user_prompt(
	message: &str,
	context: &ExtractedContext,
	max_suggestions: u32,
) -> String {
	let context_json = serde_json::to_string(context).unwrap_or_default();

	format!(
		"The user said: \"{message}\"\n\
Extracted context: {context_json}\n\n\
Suggest up to {max_suggestions} brand-new tasks that would suit this situation. Return ONLY \
the specified JSON."
	)
}

pub(crate) fn summary_prompt(
	message: &str,
	context: &ExtractedContext,
	recommendation_count: usize,
) -> String {
	let context_json = serde_json::to_string(context).unwrap_or_default();

	format!(
		"Generate a friendly, brief response to the user based on their message and the \
recommended tasks.\n\n\
User said: \"{message}\"\n\
Extracted context: {context_json}\n\
Number of recommendations: {recommendation_count}\n\n\
Write a natural, encouraging response (2-3 sentences max) that acknowledges their situation \
and introduces the recommendations."
	)
}

#[cfg(test)]
mod tests {
	use time::{Duration, macros::datetime};
	use uuid::Uuid;

	use super::*;

	fn task(due_date: Option<OffsetDateTime>) -> TaskRow {
		let now = datetime!(2024-03-10 18:30 UTC);

		TaskRow {
			task_id: Uuid::new_v4(),
			user_id: Uuid::new_v4(),
			title: "Water the plants".to_string(),
			description: Some("All of them.".to_string()),
			status: "todo".to_string(),
			priority: "medium".to_string(),
			is_active: true,
			created_at: now,
			updated_at: now,
			due_date,
			completed_at: None,
			labeling_status: "pending".to_string(),
			labeling_attempted_at: None,
			labeling_completed_at: None,
			labeling_error: None,
			vector_id: None,
			embedding_model: None,
			embedding_version: None,
		}
	}

	#[test]
	fn user_prompt_carries_task_fields_and_day_part() {
		let now = datetime!(2024-03-10 18:30 UTC);
		let prompt = labeling_user_prompt(&task(None), None, now);

		assert!(prompt.contains("Title: Water the plants"));
		assert!(prompt.contains("Description: All of them."));
		assert!(prompt.contains("Priority: medium"));
		assert!(prompt.contains("Time of Day: evening"));
		assert!(prompt.contains("Day of Week: Sunday"));
		assert!(!prompt.contains("Due Date"));
	}

	#[test]
	fn user_prompt_flags_overdue_tasks() {
		let now = datetime!(2024-03-10 18:30 UTC);
		let prompt = labeling_user_prompt(&task(Some(now - Duration::days(2))), None, now);

		assert!(prompt.contains("OVERDUE by 2 day(s)"));
	}

	#[test]
	fn user_prompt_includes_external_context() {
		let now = datetime!(2024-03-10 18:30 UTC);
		let context = LabelingContext {
			timezone: Some("Europe/Berlin".to_string()),
			location: Some("home".to_string()),
			preferences: None,
		};
		let prompt = labeling_user_prompt(&task(None), Some(&context), now);

		assert!(prompt.contains("Timezone: Europe/Berlin"));
		assert!(prompt.contains("Location: home"));
	}
}
