//! Super prompt generation.
//!
//! Rewrites a user's rough request into a structured prompt using a fixed
//! prompt-engineer template.

use crate::{config::SuperPromptConfig, error::ApiError};
use anyhow::anyhow;
use futures_core::Stream;
use futures_util::StreamExt;
use llm::{General, LLM, Message};
use pcore::ErrorKind;
use std::time::Duration;

/// The prompt-engineer system template.
pub const SYSTEM_PROMPT: &str = "\
You are a Prompt Engineer specializing in creating structured, accurate, and \
effective prompts for AI systems. Your responses must be accurate and \
minimize hallucination through systematic verification.

Context: [USER'S TASK/SITUATION]
Objective: [MAIN GOAL]

Instructions:
1. Decompose complex requests into subtasks
2. Verify information and cross-reference sources
3. Handle uncertainty explicitly with disclaimers
4. Engage domain experts when needed
5. Synthesize verified solutions

Constraints: [LIMITATIONS]
Format: [STRUCTURE]
Success: [CRITERIA]

Your task is to:
1. Analyze the user's input
2. Fill in each section of the template with appropriate content
3. Return only the completed prompt, following the exact structure above
4. Do not include any explanations, meta-commentary, or additional formatting";

/// Super prompt generator over one provider.
pub struct SuperPrompt<P: LLM> {
    provider: Option<P>,
    settings: SuperPromptConfig,
}

impl<P: LLM> SuperPrompt<P> {
    /// Create a generator. `None` means the configured provider is not
    /// available and every call fails.
    pub fn new(provider: Option<P>, settings: SuperPromptConfig) -> Self {
        Self { provider, settings }
    }

    fn provider(&self) -> Result<&P, ApiError> {
        self.provider.as_ref().ok_or_else(|| {
            ApiError::SuperPrompt(anyhow!(
                "super prompt provider '{}' is not enabled",
                self.settings.provider
            ))
        })
    }

    fn config(&self) -> General {
        General::new(self.settings.model.clone())
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.settings.timeout_secs)
    }

    /// Generate the whole prompt.
    pub async fn generate(&self, input: &str) -> Result<String, ApiError> {
        let input = validate(input)?;
        let provider = self.provider()?;
        let messages = messages(input);

        let response = tokio::time::timeout(self.timeout(), provider.send(&self.config(), &messages))
            .await
            .map_err(|_| ApiError::Timeout)?
            .map_err(|e| match ErrorKind::of(&e) {
                ErrorKind::Timeout => ApiError::Timeout,
                _ => ApiError::SuperPrompt(e),
            })?;

        response
            .content()
            .map(|prompt| prompt.trim())
            .filter(|prompt| !prompt.is_empty())
            .map(str::to_owned)
            .ok_or(ApiError::NoPrompt)
    }

    /// Stream the prompt as text deltas.
    ///
    /// Input and provider checks fail up front; failures after the first
    /// delta end the stream with an error.
    pub fn stream(
        &self,
        input: &str,
    ) -> Result<impl Stream<Item = anyhow::Result<String>> + Send + 'static, ApiError> {
        let input = validate(input)?;
        let provider = self.provider()?.clone();
        let messages = messages(input);
        let config = self.config();
        let deadline = tokio::time::Instant::now() + self.timeout();

        Ok(async_stream::try_stream! {
            let inner = provider.stream(config, &messages, false);
            futures_util::pin_mut!(inner);
            loop {
                let next = tokio::time::timeout_at(deadline, inner.next())
                    .await
                    .map_err(|_| anyhow!("super prompt stream timed out"))?;
                let Some(chunk) = next else {
                    break;
                };
                let chunk = chunk?;
                if let Some(delta) = chunk.content() {
                    yield delta.to_owned();
                }
            }
        })
    }
}

fn validate(input: &str) -> Result<&str, ApiError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ApiError::InputRequired);
    }
    Ok(input)
}

fn messages(input: &str) -> [Message; 2] {
    [Message::system(SYSTEM_PROMPT), Message::user(input)]
}
