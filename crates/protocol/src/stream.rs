//! Data-stream line codec.
//!
//! Wire format: one part per line, `<code>:<json>\n`. The code is a single
//! character naming the part type; the payload is any JSON value.
//!
//! | code | part |
//! |------|------|
//! | `0` | text delta |
//! | `g` | reasoning delta |
//! | `2` | data array |
//! | `3` | error message |
//! | `8` | message annotations |
//! | `9` | tool call |
//! | `a` | tool result |
//! | `f` | start step |
//! | `e` | finish step |
//! | `d` | finish message |

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Errors decoding a data-stream line.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The line has no `:` separator.
    #[error("missing part separator in line {0:?}")]
    MissingSeparator(String),
    /// The part code is not known.
    #[error("unknown part code {0:?}")]
    UnknownCode(String),
    /// The payload is not valid JSON or has the wrong shape.
    #[error("invalid payload for part {code}: {source}")]
    Payload {
        /// The part code.
        code: char,
        /// The decode failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Token counts reported on finish parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Prompt tokens.
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Completion tokens.
    #[serde(default)]
    pub completion_tokens: u32,
}

/// Payload of finish-step and finish-message parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishPart {
    /// Why generation stopped (`stop`, `length`, `tool-calls`, `error`, ..).
    pub finish_reason: String,
    /// Token usage.
    #[serde(default)]
    pub usage: TokenUsage,
    /// Whether another step follows; finish-step only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_continued: Option<bool>,
}

impl FinishPart {
    /// A finish payload with the given reason.
    pub fn new(finish_reason: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            finish_reason: finish_reason.into(),
            usage,
            is_continued: None,
        }
    }
}

/// One decoded data-stream line.
#[derive(Debug, Clone, PartialEq)]
pub enum DataStreamPart {
    /// `0`: text delta.
    Text(String),
    /// `g`: reasoning delta.
    Reasoning(String),
    /// `2`: data values.
    Data(Vec<Value>),
    /// `3`: user-facing error text.
    Error(String),
    /// `8`: annotations for the current assistant message.
    Annotations(Vec<Value>),
    /// `9`: a complete tool call.
    ToolCall {
        /// Id pairing the call with its result.
        tool_call_id: String,
        /// The tool name.
        tool_name: String,
        /// Arguments as JSON.
        args: Value,
    },
    /// `a`: a tool result.
    ToolResult {
        /// Id of the call this answers.
        tool_call_id: String,
        /// The result.
        result: Value,
    },
    /// `f`: a generation step started.
    StartStep {
        /// Id of the assistant message being produced.
        message_id: String,
    },
    /// `e`: a generation step finished.
    FinishStep(FinishPart),
    /// `d`: the whole message finished.
    FinishMessage(FinishPart),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolCallPayload {
    tool_call_id: String,
    tool_name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolResultPayload {
    tool_call_id: String,
    #[serde(default)]
    result: Value,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartStepPayload {
    message_id: String,
}

impl DataStreamPart {
    /// The single-character part code.
    pub fn code(&self) -> char {
        match self {
            Self::Text(_) => '0',
            Self::Reasoning(_) => 'g',
            Self::Data(_) => '2',
            Self::Error(_) => '3',
            Self::Annotations(_) => '8',
            Self::ToolCall { .. } => '9',
            Self::ToolResult { .. } => 'a',
            Self::StartStep { .. } => 'f',
            Self::FinishStep(_) => 'e',
            Self::FinishMessage(_) => 'd',
        }
    }

    fn payload(&self) -> Value {
        match self {
            Self::Text(text) | Self::Reasoning(text) | Self::Error(text) => json!(text),
            Self::Data(values) | Self::Annotations(values) => json!(values),
            Self::ToolCall {
                tool_call_id,
                tool_name,
                args,
            } => json!({ "toolCallId": tool_call_id, "toolName": tool_name, "args": args }),
            Self::ToolResult {
                tool_call_id,
                result,
            } => json!({ "toolCallId": tool_call_id, "result": result }),
            Self::StartStep { message_id } => json!({ "messageId": message_id }),
            Self::FinishStep(finish) | Self::FinishMessage(finish) => {
                serde_json::to_value(finish).unwrap_or(Value::Null)
            }
        }
    }

    /// Encode as a newline-terminated line.
    pub fn encode(&self) -> String {
        format!("{}:{}\n", self.code(), self.payload())
    }

    /// Decode one line, with or without its trailing newline.
    pub fn parse_line(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim_end_matches(['\n', '\r']);
        let (code, payload) = line
            .split_once(':')
            .ok_or_else(|| ProtocolError::MissingSeparator(line.to_owned()))?;
        let mut chars = code.chars();
        let (Some(code), None) = (chars.next(), chars.next()) else {
            return Err(ProtocolError::UnknownCode(code.to_owned()));
        };
        let decode = |source| ProtocolError::Payload { code, source };
        let value: Value = serde_json::from_str(payload).map_err(decode)?;

        Ok(match code {
            '0' => Self::Text(serde_json::from_value(value).map_err(decode)?),
            'g' => Self::Reasoning(serde_json::from_value(value).map_err(decode)?),
            '2' => Self::Data(serde_json::from_value(value).map_err(decode)?),
            '3' => Self::Error(serde_json::from_value(value).map_err(decode)?),
            '8' => Self::Annotations(serde_json::from_value(value).map_err(decode)?),
            '9' => {
                let call: ToolCallPayload = serde_json::from_value(value).map_err(decode)?;
                Self::ToolCall {
                    tool_call_id: call.tool_call_id,
                    tool_name: call.tool_name,
                    args: call.args,
                }
            }
            'a' => {
                let result: ToolResultPayload = serde_json::from_value(value).map_err(decode)?;
                Self::ToolResult {
                    tool_call_id: result.tool_call_id,
                    result: result.result,
                }
            }
            'f' => {
                let step: StartStepPayload = serde_json::from_value(value).map_err(decode)?;
                Self::StartStep {
                    message_id: step.message_id,
                }
            }
            'e' => Self::FinishStep(serde_json::from_value(value).map_err(decode)?),
            'd' => Self::FinishMessage(serde_json::from_value(value).map_err(decode)?),
            other => return Err(ProtocolError::UnknownCode(other.to_string())),
        })
    }
}

/// Reassembles data-stream lines from arbitrary byte chunks.
///
/// Bytes after the last newline are held until the next push, so lines and
/// multi-byte characters split across chunks decode intact.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and decode every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<DataStreamPart, ProtocolError>> {
        self.buffer.extend_from_slice(chunk);
        let Some(last_newline) = self.buffer.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };
        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);

        String::from_utf8_lossy(&complete)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(DataStreamPart::parse_line)
            .collect()
    }

    /// Decode a trailing line that never got its newline.
    pub fn finish(self) -> Option<Result<DataStreamPart, ProtocolError>> {
        let rest = String::from_utf8_lossy(&self.buffer);
        let rest = rest.trim();
        (!rest.is_empty()).then(|| DataStreamPart::parse_line(rest))
    }
}
