//! Manual tool-calling pre-pass.
//!
//! Models without native tool calling first get a tool-only request asking
//! them to pick a tool as JSON. The gateway runs the tool and splices the
//! result into history before the main generation call.

use super::prompt::{TOOL_SELECTION, json_object};
use crate::tools::{RETRIEVE, SEARCH};
use anyhow::Result;
use compact_str::CompactString;
use llm::{General, LLM, Message, Role};
use serde::Deserialize;
use serde_json::Value;

/// A tool chosen by the pre-pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Tool name, `search` or `retrieve`.
    pub tool: String,
    /// Tool arguments.
    pub args: Value,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    tool: Option<String>,
    #[serde(default)]
    parameters: Value,
}

/// Ask `model` which tool, if any, the latest user message needs.
///
/// Provider failures propagate. An unparsable or unknown choice means no
/// tool.
pub async fn select<P: LLM>(
    provider: &P,
    model: CompactString,
    history: &[Message],
) -> Result<Option<Selection>> {
    let mut messages = vec![Message::system(TOOL_SELECTION)];
    messages.extend(
        history
            .iter()
            .filter(|m| m.role != Role::System && m.role != Role::Tool && m.tool_calls.is_empty())
            .cloned(),
    );

    let response = provider.send(&General::new(model), &messages).await?;
    let text = response.content().map(String::as_str).unwrap_or_default();
    Ok(parse(text))
}

/// Parse the pre-pass reply.
pub fn parse(text: &str) -> Option<Selection> {
    let choice: Choice = match json_object(text).map(serde_json::from_str::<Choice>) {
        Some(Ok(choice)) => choice,
        _ => {
            tracing::warn!("tool selection reply is not valid JSON, skipping tools");
            return None;
        }
    };
    let tool = choice.tool?;
    if tool != SEARCH && tool != RETRIEVE {
        tracing::warn!("tool selection picked unavailable tool '{tool}'");
        return None;
    }
    let args = match choice.parameters {
        Value::Object(_) => choice.parameters,
        _ => Value::Object(Default::default()),
    };
    Some(Selection { tool, args })
}

/// Messages that hand a pre-pass result to the main generation call.
pub fn result_messages(result: &Value) -> [Message; 2] {
    [
        Message::assistant(format!("Tool call result: {result}")),
        Message::user("Now answer the user question."),
    ]
}
