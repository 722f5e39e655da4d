use time::OffsetDateTime;

/// The seven wall-clock buckets fed into the labeling prompt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DayPart {
	EarlyMorning,
	Morning,
	Midday,
	Afternoon,
	Evening,
	Night,
	LateNight,
}
impl DayPart {
	pub fn from_hour(hour: u8) -> Self {
		match hour {
			5..=7 => Self::EarlyMorning,
			8..=11 => Self::Morning,
			12..=13 => Self::Midday,
			14..=16 => Self::Afternoon,
			17..=20 => Self::Evening,
			21..=23 => Self::Night,
			_ => Self::LateNight,
		}
	}

	pub fn of(ts: OffsetDateTime) -> Self {
		Self::from_hour(ts.hour())
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::EarlyMorning => "early-morning",
			Self::Morning => "morning",
			Self::Midday => "midday",
			Self::Afternoon => "afternoon",
			Self::Evening => "evening",
			Self::Night => "night",
			Self::LateNight => "late-night",
		}
	}
}

/// Due-date urgency bucket attached to the labeling prompt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Urgency {
	Overdue { days: i64 },
	DueToday,
	DueWithinThreeDays { days: i64 },
	DueLater { days: i64 },
	None,
}
impl Urgency {
	pub fn from_due_date(due_date: Option<OffsetDateTime>, now: OffsetDateTime) -> Self {
		let Some(due_date) = due_date else {
			return Self::None;
		};

		if due_date < now {
			return Self::Overdue { days: (now - due_date).whole_days().max(1) };
		}

		match (due_date - now).whole_days() {
			0 => Self::DueToday,
			days @ 1..=3 => Self::DueWithinThreeDays { days },
			days => Self::DueLater { days },
		}
	}

	pub fn describe(&self) -> Option<String> {
		match self {
			Self::Overdue { days } => Some(format!("OVERDUE by {days} day(s)")),
			Self::DueToday => Some("DUE TODAY".to_string()),
			Self::DueWithinThreeDays { days } => Some(format!("Due in {days} day(s) (urgent)")),
			Self::DueLater { days } => Some(format!("Due in {days} day(s)")),
			Self::None => None,
		}
	}
}
