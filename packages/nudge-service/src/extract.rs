use crate::{NudgeService, prompts};
use nudge_domain::scoring::ExtractedContext;

const EXTRACTION_TEMPERATURE: f32 = 0.3;
const EXTRACTION_MAX_TOKENS: u32 = 500;

impl NudgeService {
	/// Interprets a free-text situation message. Degrades to an empty context
	/// on any collaborator or decode failure; recommendation must keep
	/// working when extraction cannot.
	pub async fn extract_context(&self, message: &str) -> ExtractedContext {
		let user_prompt = prompts::extraction_user_prompt(message);

		match self
			.providers
			.completion
			.complete(
				&self.cfg.providers.llm,
				prompts::extraction_system_prompt(),
				&user_prompt,
				EXTRACTION_TEMPERATURE,
				EXTRACTION_MAX_TOKENS,
			)
			.await
		{
			Ok(content) => decode_context(&content),
			Err(err) => {
				tracing::warn!(error = %err, "Context extraction call failed. Using empty context.");

				ExtractedContext::default()
			},
		}
	}
}

pub(crate) fn decode_context(content: &str) -> ExtractedContext {
	match serde_json::from_str(content.trim()) {
		Ok(context) => context,
		Err(err) => {
			tracing::warn!(error = %err, "Context extraction returned malformed JSON. Using empty context.");

			ExtractedContext::default()
		},
	}
}
