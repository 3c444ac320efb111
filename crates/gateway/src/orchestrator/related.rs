//! Related question suggestions.

use super::prompt::{RELATED_QUESTIONS, json_object};
use anyhow::{Context, Result};
use compact_str::CompactString;
use llm::{General, LLM, Message, Role};
use protocol::RelatedQuestions;

/// How many follow-ups to suggest.
const MAX_QUESTIONS: usize = 3;

/// Ask the model for follow-up questions on the latest exchange.
pub async fn generate<P: LLM>(
    provider: &P,
    model: CompactString,
    history: &[Message],
) -> Result<RelatedQuestions> {
    let mut messages = vec![Message::system(RELATED_QUESTIONS)];
    let last_user = history.iter().rposition(|m| m.role == Role::User);
    if let Some(idx) = last_user {
        messages.push(Message::user(history[idx].content.as_str()));
        if let Some(answer) = history[idx..]
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant && !m.content.is_empty())
        {
            messages.push(Message::assistant(answer.content.as_str()));
            messages.push(Message::user("Suggest three follow-up queries."));
        }
    }

    let response = provider.send(&General::new(model), &messages).await?;
    let text = response.content().map(String::as_str).unwrap_or_default();
    parse(text)
}

/// Parse a related-questions reply.
pub fn parse(text: &str) -> Result<RelatedQuestions> {
    let json = json_object(text).context("related questions reply has no JSON object")?;
    let mut questions: RelatedQuestions =
        serde_json::from_str(json).context("malformed related questions")?;
    questions.items.retain(|item| !item.query.trim().is_empty());
    questions.items.truncate(MAX_QUESTIONS);
    Ok(questions)
}
