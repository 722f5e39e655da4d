use std::{collections::HashSet, fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Shape of a canonical label name: lowercase, hyphen-joined tokens, with a
/// trailing `+` allowed for open-ended duration labels such as `extended-4hr+`.
static LABEL_NAME: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*\+?$").expect("Label name pattern must compile.")
});

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelCategory {
	Location,
	Time,
	Energy,
	Duration,
	Mood,
	Category,
	Prerequisites,
	Context,
	Tools,
	People,
	Weather,
	Other,
}
impl LabelCategory {
	pub const ALL: [Self; 12] = [
		Self::Location,
		Self::Time,
		Self::Energy,
		Self::Duration,
		Self::Mood,
		Self::Category,
		Self::Prerequisites,
		Self::Context,
		Self::Tools,
		Self::People,
		Self::Weather,
		Self::Other,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Location => "location",
			Self::Time => "time",
			Self::Energy => "energy",
			Self::Duration => "duration",
			Self::Mood => "mood",
			Self::Category => "category",
			Self::Prerequisites => "prerequisites",
			Self::Context => "context",
			Self::Tools => "tools",
			Self::People => "people",
			Self::Weather => "weather",
			Self::Other => "other",
		}
	}
}
impl FromStr for LabelCategory {
	type Err = UnknownCategory;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.iter()
			.copied()
			.find(|category| category.as_str() == raw)
			.ok_or_else(|| UnknownCategory { raw: raw.to_string() })
	}
}
impl fmt::Display for LabelCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug)]
pub struct UnknownCategory {
	pub raw: String,
}
impl fmt::Display for UnknownCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Unknown label category: {}.", self.raw)
	}
}
impl std::error::Error for UnknownCategory {}

/// One label as produced by the LLM collaborator. Ephemeral; persisted only
/// through the ranking step.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GeneratedLabel {
	#[serde(rename = "label_name")]
	pub name: String,
	pub category: LabelCategory,
	pub confidence: f32,
	pub reasoning: String,
}

/// The structured batch decoded from one labeling completion.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LabelBatch {
	pub labels: Vec<GeneratedLabel>,
	#[serde(default)]
	pub summary: String,
	#[serde(default)]
	pub external_factors_considered: Vec<String>,
}

#[derive(Debug, PartialEq)]
pub enum BatchViolation {
	TooFewLabels { count: usize, min: usize },
	TooFewCategories { count: usize, min: usize },
	ConfidenceOutOfRange { name: String, confidence: f32 },
	EmptyName,
}
impl fmt::Display for BatchViolation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::TooFewLabels { count, min } => {
				write!(f, "Batch carries {count} labels; at least {min} are required.")
			},
			Self::TooFewCategories { count, min } => {
				write!(f, "Batch spans {count} categories; at least {min} are required.")
			},
			Self::ConfidenceOutOfRange { name, confidence } => {
				write!(f, "Label {name:?} confidence {confidence} is outside [0, 1].")
			},
			Self::EmptyName => f.write_str("Batch contains a label with an empty name."),
		}
	}
}
impl std::error::Error for BatchViolation {}

/// Checks the contract every generated batch must satisfy before persistence:
/// enough labels, enough distinct categories, every confidence within [0, 1].
pub fn validate_batch(
	labels: &[GeneratedLabel],
	min_labels: usize,
	min_categories: usize,
) -> Result<(), BatchViolation> {
	if labels.len() < min_labels {
		return Err(BatchViolation::TooFewLabels { count: labels.len(), min: min_labels });
	}

	let categories: HashSet<LabelCategory> = labels.iter().map(|label| label.category).collect();

	if categories.len() < min_categories {
		return Err(BatchViolation::TooFewCategories {
			count: categories.len(),
			min: min_categories,
		});
	}

	for label in labels {
		if label.name.trim().is_empty() {
			return Err(BatchViolation::EmptyName);
		}
		if !(0.0..=1.0).contains(&label.confidence) || !label.confidence.is_finite() {
			return Err(BatchViolation::ConfidenceOutOfRange {
				name: label.name.clone(),
				confidence: label.confidence,
			});
		}
	}

	Ok(())
}

pub fn is_canonical_name(name: &str) -> bool {
	LABEL_NAME.is_match(name)
}

/// Folds a model-produced name into the canonical lowercase hyphenated form.
pub fn normalize_name(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	let mut last_was_hyphen = true;

	for ch in raw.trim().chars() {
		if ch.is_ascii_alphanumeric() || ch == '+' {
			out.extend(ch.to_lowercase());
			last_was_hyphen = false;
		} else if !last_was_hyphen {
			out.push('-');
			last_was_hyphen = true;
		}
	}

	while out.ends_with('-') {
		out.pop();
	}

	out
}
