//! Chat completions request body.

use crate::{General, Message, Tool, ToolChoice};
use compact_str::CompactString;
use serde::Serialize;

/// Body of a chat completions call. Unset knobs are left off the wire.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Model id.
    pub model: CompactString,
    /// Conversation, oldest first.
    pub messages: Vec<Message>,
    /// Output token cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Tools, wrapped as functions.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<FunctionTool>,
    /// Only sent alongside tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    /// Stream server-sent events.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
    /// Set when streaming with usage reporting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<StreamOptions>,
}

/// A tool in the `{"type": "function", "function": ..}` envelope.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionTool {
    /// Always `function`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// The tool.
    pub function: Tool,
}

/// Streaming options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamOptions {
    /// Report token usage in a final chunk.
    pub include_usage: bool,
}

impl Request {
    /// A non-streaming request for `messages` under `config`.
    pub fn new(config: General, messages: &[Message]) -> Self {
        let tools: Vec<_> = config
            .tools
            .into_iter()
            .flatten()
            .map(|function| FunctionTool {
                kind: "function",
                function,
            })
            .collect();
        let tool_choice = config.tool_choice.filter(|_| !tools.is_empty());
        Self {
            model: config.model,
            messages: messages.to_vec(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            tools,
            tool_choice,
            stream: false,
            stream_options: None,
        }
    }

    /// Stream the response, optionally with a final usage chunk.
    pub fn streaming(mut self, usage: bool) -> Self {
        self.stream = true;
        self.stream_options = usage.then_some(StreamOptions {
            include_usage: true,
        });
        self
    }
}
