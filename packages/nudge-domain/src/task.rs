use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
	Todo,
	InProgress,
	Completed,
	Cancelled,
}
impl TaskStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Todo => "todo",
			Self::InProgress => "in_progress",
			Self::Completed => "completed",
			Self::Cancelled => "cancelled",
		}
	}
}
impl FromStr for TaskStatus {
	type Err = UnknownVariant;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"todo" => Ok(Self::Todo),
			"in_progress" => Ok(Self::InProgress),
			"completed" => Ok(Self::Completed),
			"cancelled" => Ok(Self::Cancelled),
			_ => Err(UnknownVariant { field: "task status", raw: raw.to_string() }),
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
	Low,
	Medium,
	High,
	Urgent,
}
impl TaskPriority {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Low => "low",
			Self::Medium => "medium",
			Self::High => "high",
			Self::Urgent => "urgent",
		}
	}
}
impl FromStr for TaskPriority {
	type Err = UnknownVariant;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"low" => Ok(Self::Low),
			"medium" => Ok(Self::Medium),
			"high" => Ok(Self::High),
			"urgent" => Ok(Self::Urgent),
			_ => Err(UnknownVariant { field: "task priority", raw: raw.to_string() }),
		}
	}
}

/// Per-task labeling lifecycle. `InProgress` is set immediately before the
/// slow LLM call; a run left there by a crash is retryable, never
/// auto-recovered.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelingStatus {
	Pending,
	InProgress,
	Completed,
	Failed,
}
impl LabelingStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::InProgress => "in_progress",
			Self::Completed => "completed",
			Self::Failed => "failed",
		}
	}
}
impl FromStr for LabelingStatus {
	type Err = UnknownVariant;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"pending" => Ok(Self::Pending),
			"in_progress" => Ok(Self::InProgress),
			"completed" => Ok(Self::Completed),
			"failed" => Ok(Self::Failed),
			_ => Err(UnknownVariant { field: "labeling status", raw: raw.to_string() }),
		}
	}
}

#[derive(Debug)]
pub struct UnknownVariant {
	pub field: &'static str,
	pub raw: String,
}
impl fmt::Display for UnknownVariant {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Unknown {}: {}.", self.field, self.raw)
	}
}
impl std::error::Error for UnknownVariant {}
