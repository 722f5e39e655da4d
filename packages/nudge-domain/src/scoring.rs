use serde::{Deserialize, Serialize};

/// Weight on how much of the context found a matching label.
const COVERAGE_WEIGHT: f32 = 0.4;
/// Weight on the mean confidence of the matched labels.
const CONFIDENCE_WEIGHT: f32 = 0.5;
/// Additive bonus per match, capped.
const MATCH_BONUS_STEP: f32 = 0.1;
const MATCH_BONUS_CAP: f32 = 0.3;

/// Structured interpretation of a free-text user situation. Transient;
/// recomputed for every recommendation request.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ExtractedContext {
	pub location: Option<String>,
	pub time_of_day: Option<String>,
	pub energy_level: Option<String>,
	pub mood: Option<String>,
	pub duration_available: Option<String>,
	#[serde(default)]
	pub other_labels: Vec<String>,
}
impl ExtractedContext {
	/// Flattens the context into its candidate strings, in the fixed field
	/// order. The order carries no numeric weight; it only keeps the match
	/// list deterministic.
	pub fn flatten(&self) -> Vec<&str> {
		let mut out = Vec::with_capacity(5 + self.other_labels.len());

		for field in [
			self.location.as_deref(),
			self.time_of_day.as_deref(),
			self.energy_level.as_deref(),
			self.mood.as_deref(),
			self.duration_available.as_deref(),
		]
		.into_iter()
		.flatten()
		{
			out.push(field);
		}
		for label in &self.other_labels {
			out.push(label.as_str());
		}

		out
	}

	pub fn is_empty(&self) -> bool {
		self.flatten().is_empty()
	}
}

/// A stored label reduced to what scoring needs.
#[derive(Clone, Debug)]
pub struct LabelSignal {
	pub name: String,
	pub confidence: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchScore {
	pub score: f32,
	pub matching_labels: Vec<String>,
}
impl MatchScore {
	fn zero() -> Self {
		Self { score: 0.0, matching_labels: Vec::new() }
	}
}

/// Scores one task's labels against an extracted context. Pure and
/// deterministic: no matches means score zero, otherwise coverage, mean
/// matched confidence, and a capped per-match bonus blend into [0, 1].
///
/// A context string may match several labels; each match contributes its
/// label's confidence and repeats the context string in the match list.
pub fn score_labels(labels: &[LabelSignal], context: &ExtractedContext) -> MatchScore {
	let candidates = context.flatten();

	if candidates.is_empty() {
		return MatchScore::zero();
	}

	let mut matching_labels = Vec::new();
	let mut confidence_sum = 0.0_f32;

	for candidate in &candidates {
		for label in labels {
			if candidate.eq_ignore_ascii_case(&label.name) {
				matching_labels.push((*candidate).to_string());

				confidence_sum += label.confidence;
			}
		}
	}

	if matching_labels.is_empty() {
		return MatchScore::zero();
	}

	let matched = matching_labels.len() as f32;
	let coverage = matched / candidates.len() as f32;
	let avg_confidence = confidence_sum / matched;
	let match_bonus = (matched * MATCH_BONUS_STEP).min(MATCH_BONUS_CAP);
	let score = (coverage * COVERAGE_WEIGHT + avg_confidence * CONFIDENCE_WEIGHT + match_bonus)
		.min(1.0);

	MatchScore { score, matching_labels }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn signal(name: &str, confidence: f32) -> LabelSignal {
		LabelSignal { name: name.to_string(), confidence }
	}

	fn context_with_location(location: &str) -> ExtractedContext {
		ExtractedContext { location: Some(location.to_string()), ..Default::default() }
	}

	#[test]
	fn empty_context_never_matches() {
		let labels = vec![signal("home", 0.95), signal("evening", 0.9)];
		let result = score_labels(&labels, &ExtractedContext::default());

		assert_eq!(result, MatchScore { score: 0.0, matching_labels: vec![] });
	}

	#[test]
	fn single_exact_match_scores_per_formula() {
		// coverage 1.0 * 0.4 + confidence 0.9 * 0.5 + bonus 0.1 = 0.95.
		let labels = vec![signal("home", 0.9)];
		let result = score_labels(&labels, &context_with_location("home"));

		assert!((result.score - 0.95).abs() < 1e-6);
		assert_eq!(result.matching_labels, vec!["home".to_string()]);
	}

	#[test]
	fn no_overlap_scores_zero_regardless_of_confidence() {
		let labels = vec![signal("office", 1.0), signal("morning", 1.0)];
		let result = score_labels(&labels, &context_with_location("home"));

		assert_eq!(result, MatchScore { score: 0.0, matching_labels: vec![] });
	}

	#[test]
	fn matching_is_case_insensitive() {
		let labels = vec![signal("Home", 0.9)];
		let result = score_labels(&labels, &context_with_location("HOME"));

		assert!(result.score > 0.0);
	}

	#[test]
	fn one_context_string_can_match_several_labels() {
		let labels = vec![signal("home", 0.8), signal("home", 0.6)];
		let result = score_labels(&labels, &context_with_location("home"));

		// Both matches count: coverage 2/1 capped only at the end, avg 0.7,
		// bonus 0.2; the final min keeps the score within [0, 1].
		assert_eq!(result.matching_labels, vec!["home".to_string(), "home".to_string()]);
		assert!((result.score - 1.0).abs() < 1e-6);
	}

	#[test]
	fn bonus_is_capped_at_four_or_more_matches() {
		let labels = vec![
			signal("home", 0.5),
			signal("evening", 0.5),
			signal("low-energy", 0.5),
			signal("quick-5min", 0.5),
		];
		let context = ExtractedContext {
			location: Some("home".to_string()),
			time_of_day: Some("evening".to_string()),
			energy_level: Some("low-energy".to_string()),
			duration_available: Some("quick-5min".to_string()),
			..Default::default()
		};
		let result = score_labels(&labels, &context);

		// coverage 1.0 * 0.4 + avg 0.5 * 0.5 + bonus capped at 0.3 = 0.95.
		assert!((result.score - 0.95).abs() < 1e-6);
		assert_eq!(result.matching_labels.len(), 4);
	}

	#[test]
	fn flatten_keeps_field_order_then_other_labels() {
		let context = ExtractedContext {
			location: Some("home".to_string()),
			time_of_day: None,
			energy_level: Some("low-energy".to_string()),
			mood: None,
			duration_available: Some("short-15min".to_string()),
			other_labels: vec!["quiet-needed".to_string(), "solo".to_string()],
		};

		assert_eq!(
			context.flatten(),
			vec!["home", "low-energy", "short-15min", "quiet-needed", "solo"]
		);
	}

	#[test]
	fn context_decodes_with_null_fields() {
		let context: ExtractedContext = serde_json::from_value(serde_json::json!({
			"location": "home",
			"time_of_day": null,
			"energy_level": null,
			"mood": "focused",
			"duration_available": null,
			"other_labels": ["solo"]
		}))
		.expect("decode failed");

		assert_eq!(context.flatten(), vec!["home", "focused", "solo"]);
	}
}
