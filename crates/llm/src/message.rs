//! Provider-side conversation messages.
//!
//! Messages mirror the chat completions wire shape. Reasoning text is kept
//! on the message that produced it but never replayed to a provider.

use crate::{StreamChunk, ToolCall};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model.
    System,
    /// The person chatting.
    #[default]
    User,
    /// The model.
    Assistant,
    /// A tool result answering an assistant tool call.
    Tool,
}

/// One message of a provider conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author.
    pub role: Role,
    /// Text content.
    #[serde(default)]
    pub content: String,
    /// Reasoning streamed alongside the answer.
    #[serde(default, skip_serializing)]
    pub reasoning_content: String,
    /// For tool messages, the call being answered.
    #[serde(default, skip_serializing_if = "CompactString::is_empty")]
    pub tool_call_id: CompactString,
    /// Tool calls made by an assistant message.
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub tool_calls: SmallVec<[ToolCall; 4]>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            ..Default::default()
        }
    }

    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// An assistant text message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// An assistant message that only calls tools.
    pub fn tool_calls(calls: impl IntoIterator<Item = ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            tool_calls: calls.into_iter().collect(),
            ..Default::default()
        }
    }

    /// A tool result for `call_id`.
    pub fn tool(content: impl Into<String>, call_id: impl Into<CompactString>) -> Self {
        Self {
            tool_call_id: call_id.into(),
            ..Self::new(Role::Tool, content)
        }
    }

    /// Start assembling a streamed message.
    pub fn builder(role: Role) -> MessageBuilder {
        MessageBuilder::new(role)
    }

    /// Approximate token count of what is sent upstream: one token per four
    /// characters, rounded up, and never zero.
    pub fn estimate_tokens(&self) -> usize {
        let calls: usize = self
            .tool_calls
            .iter()
            .map(|call| call.function.name.len() + call.function.arguments.chars().count())
            .sum();
        let chars = self.content.chars().count() + self.tool_call_id.len() + calls;
        chars.div_ceil(4).max(1)
    }
}

/// Approximate token count of a whole conversation.
pub fn estimate_tokens(messages: &[Message]) -> usize {
    messages.iter().map(Message::estimate_tokens).sum()
}

/// Assembles a message from stream chunks.
///
/// Tool call fragments are merged by their stream index.
pub struct MessageBuilder {
    message: Message,
    calls: BTreeMap<u32, ToolCall>,
}

impl MessageBuilder {
    /// An empty message for `role`.
    pub fn new(role: Role) -> Self {
        Self {
            message: Message {
                role,
                ..Default::default()
            },
            calls: BTreeMap::new(),
        }
    }

    /// Fold one chunk in.
    pub fn accept(&mut self, chunk: &StreamChunk) {
        if let Some(text) = chunk.content() {
            self.message.content.push_str(text);
        }
        if let Some(reasoning) = chunk.reasoning_content() {
            self.message.reasoning_content.push_str(reasoning);
        }
        for fragment in chunk.tool_calls().unwrap_or_default() {
            self.calls.entry(fragment.index).or_default().merge(fragment);
        }
    }

    /// The finished message. Call fragments that never named a function
    /// are dropped.
    pub fn build(mut self) -> Message {
        self.message.tool_calls = self
            .calls
            .into_values()
            .filter(|call| !call.function.name.is_empty())
            .collect();
        self.message
    }
}
