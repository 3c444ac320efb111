//! UI message model.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Role of a UI message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiRole {
    /// Written by the user.
    #[default]
    User,
    /// Produced by the model.
    Assistant,
    /// Instructions.
    System,
    /// Side-channel annotation payloads.
    Data,
}

/// A message as the client renders and stores it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiMessage {
    /// Message id, unique within a chat.
    #[serde(default)]
    pub id: String,
    /// Who produced the message.
    pub role: UiRole,
    /// Text content. Non-string JSON content (data messages) is kept as
    /// its JSON text.
    #[serde(default, deserialize_with = "content_text")]
    pub content: String,
    /// Structured parts, in stream order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,
    /// Annotations attached while streaming.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<Value>>,
    /// Creation time, RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl UiMessage {
    /// A user message.
    pub fn user(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: UiRole::User,
            content: content.into(),
            ..Default::default()
        }
    }

    /// An assistant message.
    pub fn assistant(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: UiRole::Assistant,
            content: content.into(),
            ..Default::default()
        }
    }

    /// A data message carrying a JSON payload.
    pub fn data(id: impl Into<String>, payload: &Value) -> Self {
        Self {
            id: id.into(),
            role: UiRole::Data,
            content: payload.to_string(),
            ..Default::default()
        }
    }

    /// Append a part, creating the part list if needed.
    pub fn push_part(&mut self, part: Part) {
        self.parts.get_or_insert_with(Vec::new).push(part);
    }

    /// Append an annotation, creating the list if needed.
    pub fn push_annotation(&mut self, annotation: Value) {
        self.annotations.get_or_insert_with(Vec::new).push(annotation);
    }

    /// Tool invocations carried in the parts, in order.
    pub fn tool_invocations(&self) -> impl Iterator<Item = &ToolInvocation> {
        self.parts.iter().flatten().filter_map(|part| match part {
            Part::ToolInvocation { tool_invocation } => Some(tool_invocation),
            _ => None,
        })
    }

    /// Concatenated reasoning parts.
    pub fn reasoning(&self) -> String {
        self.parts
            .iter()
            .flatten()
            .filter_map(|part| match part {
                Part::Reasoning { reasoning } => Some(reasoning.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// One structured part of a UI message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Part {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// Model reasoning.
    Reasoning {
        /// The reasoning text.
        reasoning: String,
    },
    /// A tool call and, once available, its result.
    ToolInvocation {
        /// The invocation.
        #[serde(rename = "toolInvocation")]
        tool_invocation: ToolInvocation,
    },
    /// Boundary between generation steps.
    StepStart,
    /// Any part type this crate does not model.
    #[serde(other)]
    Unknown,
}

/// Lifecycle of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvocationState {
    /// Arguments still streaming.
    PartialCall,
    /// Arguments complete, no result yet.
    Call,
    /// Result available.
    Result,
}

/// A model-initiated tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    /// Invocation state.
    pub state: InvocationState,
    /// Id pairing the call with its result.
    pub tool_call_id: String,
    /// The tool name.
    pub tool_name: String,
    /// Arguments as JSON.
    #[serde(default)]
    pub args: Value,
    /// The result, once the tool ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

fn content_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
