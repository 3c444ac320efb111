//! Tool definitions and the calls models make.

use compact_str::CompactString;
use schemars::{JsonSchema, Schema};
use serde::{Deserialize, Serialize};

/// A function the model may call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Function name.
    pub name: CompactString,
    /// What the function does, for the model.
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Schema,
    /// Ask the provider to validate arguments against the schema.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strict: bool,
}

impl Tool {
    /// A tool whose arguments deserialize into `T`.
    pub fn of<T: JsonSchema>(
        name: impl Into<CompactString>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: schemars::schema_for!(T),
            strict: false,
        }
    }
}

/// A tool call, whole or as a streamed fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call id. Some providers leave it empty.
    #[serde(default, skip_serializing_if = "CompactString::is_empty")]
    pub id: CompactString,
    /// Position among the calls of one streamed message.
    #[serde(default, skip_serializing)]
    pub index: u32,
    /// Always `function`.
    #[serde(default, rename = "type")]
    pub call_type: CompactString,
    /// The function and its arguments.
    pub function: FunctionCall,
}

impl ToolCall {
    /// A complete function call.
    pub fn function(
        id: impl Into<CompactString>,
        name: impl Into<CompactString>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            index: 0,
            call_type: "function".into(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    /// Fold a streamed fragment in. Ids and names arrive whole; arguments
    /// arrive in pieces.
    pub fn merge(&mut self, fragment: &Self) {
        if !fragment.id.is_empty() {
            self.id.clone_from(&fragment.id);
        }
        if !fragment.call_type.is_empty() {
            self.call_type.clone_from(&fragment.call_type);
        }
        if !fragment.function.name.is_empty() {
            self.function.name.clone_from(&fragment.function.name);
        }
        self.function.arguments.push_str(&fragment.function.arguments);
    }
}

/// Function name plus JSON-encoded arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name.
    #[serde(default, skip_serializing_if = "CompactString::is_empty")]
    pub name: CompactString,
    /// Arguments as a JSON string.
    #[serde(default)]
    pub arguments: String,
}

/// Whether the model may call tools on a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Call tools or answer, as the model sees fit.
    #[default]
    Auto,
    /// Answer in text.
    None,
    /// Call at least one tool.
    Required,
}
