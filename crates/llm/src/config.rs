//! Per-call completion settings.

use crate::{Tool, ToolChoice};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Provider-independent settings for one completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct General {
    /// Model id as the provider knows it.
    pub model: CompactString,
    /// Tools offered on this call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Tool policy; ignored without tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Output token cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
}

impl General {
    /// Settings for `model` with provider defaults.
    pub fn new(model: impl Into<CompactString>) -> Self {
        Self {
            model: model.into(),
            tools: None,
            tool_choice: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Offer tools. An empty list offers none.
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = (!tools.is_empty()).then_some(tools);
        self
    }

    /// Set the tool policy.
    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = Some(tool_choice);
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Cap the output tokens.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl Default for General {
    fn default() -> Self {
        Self::new("gpt-4o-mini")
    }
}
