//! Selected model description.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// How a model performs tool calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallType {
    /// The provider runs tool calling natively.
    #[default]
    Native,
    /// The gateway runs a tool pre-pass before generation.
    Manual,
}

/// The model a client selected, as sent in the model cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpec {
    /// Provider-local model id.
    pub id: CompactString,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Provider display name.
    #[serde(default)]
    pub provider: String,
    /// Provider id, matched against the gateway's provider registry.
    pub provider_id: CompactString,
    /// Whether the model may be used.
    #[serde(default = "enabled")]
    pub enabled: bool,
    /// Tool-calling strategy.
    #[serde(default)]
    pub tool_call_type: ToolCallType,
    /// Model used for the manual tool pre-pass, if not the model itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_model: Option<CompactString>,
}

fn enabled() -> bool {
    true
}

impl ModelSpec {
    /// `providerId:id`, the key used for limits and logs.
    pub fn qualified_id(&self) -> String {
        format!("{}:{}", self.provider_id, self.id)
    }

    /// Model used for the manual tool pre-pass.
    pub fn tool_call_model(&self) -> &str {
        self.tool_call_model.as_deref().unwrap_or(&self.id)
    }
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            id: "gpt-4o-mini".into(),
            name: "GPT-4o mini".into(),
            provider: "OpenAI".into(),
            provider_id: "openai".into(),
            enabled: true,
            tool_call_type: ToolCallType::Native,
            tool_call_model: None,
        }
    }
}
