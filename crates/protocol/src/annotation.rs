//! Side-channel annotations attached to assistant messages.

use crate::ToolInvocation;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A typed annotation, serialized as `{"type": .., "data": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum StreamAnnotation {
    /// How long the model reasoned, in milliseconds.
    Reasoning(ReasoningData),
    /// Suggested follow-up questions.
    RelatedQuestions(RelatedQuestions),
    /// A tool call made by the manual pre-pass.
    #[serde(rename = "tool_call")]
    ToolCall(ToolInvocation),
}

impl StreamAnnotation {
    /// The annotation as a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Reasoning span timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningData {
    /// Elapsed milliseconds.
    pub time: u64,
    /// Full reasoning text; only present in persisted annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Related question suggestions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatedQuestions {
    /// The suggestions.
    pub items: Vec<RelatedQuestion>,
}

/// One suggested follow-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedQuestion {
    /// The question text.
    pub query: String,
}
