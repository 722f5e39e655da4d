use std::cmp::Ordering;

use crate::taxonomy::GeneratedLabel;

/// A generated label placed into its persisted position: sorted by descending
/// confidence (original batch order breaks ties) with the top slice primary.
#[derive(Clone, Debug)]
pub struct RankedLabel {
	pub label: GeneratedLabel,
	pub is_primary: bool,
}

/// Orders a validated batch for persistence. The sort must be stable so that
/// equal-confidence labels keep their batch order and repeated runs over the
/// same batch produce the same primary set.
pub fn rank_by_confidence(labels: Vec<GeneratedLabel>, primary_count: usize) -> Vec<RankedLabel> {
	let mut labels = labels;

	labels.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(Ordering::Equal));

	labels
		.into_iter()
		.enumerate()
		.map(|(index, label)| RankedLabel { label, is_primary: index < primary_count })
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::taxonomy::LabelCategory;

	fn label(name: &str, confidence: f32) -> GeneratedLabel {
		GeneratedLabel {
			name: name.to_string(),
			category: LabelCategory::Other,
			confidence,
			reasoning: String::new(),
		}
	}

	#[test]
	fn primary_set_is_top_five_by_confidence() {
		let batch = vec![
			label("a", 0.2),
			label("b", 0.9),
			label("c", 0.5),
			label("d", 0.8),
			label("e", 0.7),
			label("f", 0.6),
			label("g", 0.1),
		];
		let ranked = rank_by_confidence(batch, 5);
		let names: Vec<&str> = ranked.iter().map(|r| r.label.name.as_str()).collect();

		assert_eq!(names, vec!["b", "d", "e", "f", "c", "a", "g"]);
		assert_eq!(ranked.iter().filter(|r| r.is_primary).count(), 5);
		assert!(ranked[..5].iter().all(|r| r.is_primary));
		assert!(ranked[5..].iter().all(|r| !r.is_primary));
	}

	#[test]
	fn ties_keep_original_batch_order() {
		let batch =
			vec![label("first", 0.5), label("second", 0.5), label("third", 0.5), label("top", 0.9)];
		let ranked = rank_by_confidence(batch, 2);
		let names: Vec<&str> = ranked.iter().map(|r| r.label.name.as_str()).collect();

		assert_eq!(names, vec!["top", "first", "second", "third"]);
	}

	#[test]
	fn small_batches_are_fully_primary() {
		let ranked = rank_by_confidence(vec![label("a", 0.3), label("b", 0.4)], 5);

		assert!(ranked.iter().all(|r| r.is_primary));
	}
}
