use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Embeds a single document and checks the returned dimension against the
/// configured one. Tasks are embedded one at a time; there is no batch path.
pub async fn embed_one(cfg: &nudge_config::EmbeddingProviderConfig, text: &str) -> Result<Vec<f32>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": text,
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let vector = parse_single_embedding(json)?;

	if vector.len() != cfg.dimensions as usize {
		return Err(eyre::eyre!(
			"Embedding dimension {} does not match configured dimensions {}.",
			vector.len(),
			cfg.dimensions
		));
	}

	Ok(vector)
}

fn parse_single_embedding(json: Value) -> Result<Vec<f32>> {
	let embedding = json
		.get("data")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|item| item.get("embedding"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Embedding response is missing an embedding array."))?;
	let mut vector = Vec::with_capacity(embedding.len());

	for value in embedding {
		let number =
			value.as_f64().ok_or_else(|| eyre::eyre!("Embedding value must be numeric."))?;

		vector.push(number as f32);
	}

	Ok(vector)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_first_embedding_vector() {
		let json = serde_json::json!({
			"data": [
				{ "index": 0, "embedding": [0.5, -1.5, 2.0] }
			]
		});
		let parsed = parse_single_embedding(json).expect("parse failed");

		assert_eq!(parsed, vec![0.5, -1.5, 2.0]);
	}

	#[test]
	fn missing_data_is_an_error() {
		let json = serde_json::json!({ "data": [] });

		assert!(parse_single_embedding(json).is_err());
	}

	#[test]
	fn non_numeric_values_are_rejected() {
		let json = serde_json::json!({
			"data": [
				{ "embedding": [0.5, "oops"] }
			]
		});

		assert!(parse_single_embedding(json).is_err());
	}
}
