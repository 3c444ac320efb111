//! Folding data-stream parts into the session's messages.

use protocol::{DataStreamPart, InvocationState, Part, ToolInvocation, UiMessage, UiRole};
use serde_json::Value;

/// Effect of one applied part.
#[derive(Debug, PartialEq)]
pub(crate) enum Applied {
    /// Messages or data changed.
    Updated,
    /// The message finished.
    Finished,
    /// The gateway reported an error.
    Failed(String),
}

/// Tracks the assistant message a response is writing into.
#[derive(Debug, Default)]
pub(crate) struct Pending {
    index: Option<usize>,
}

impl Pending {
    /// Continue writing into the message at `index`.
    pub fn resume(index: usize) -> Self {
        Self { index: Some(index) }
    }

    pub fn apply(
        &mut self,
        messages: &mut Vec<UiMessage>,
        data: &mut Vec<Value>,
        part: DataStreamPart,
    ) -> Applied {
        match part {
            DataStreamPart::StartStep { message_id } => {
                if self.current(messages).is_some() {
                    self.message(messages, None).push_part(Part::StepStart);
                } else {
                    self.message(messages, Some(message_id));
                }
            }
            DataStreamPart::Text(delta) => {
                let message = self.message(messages, None);
                message.content.push_str(&delta);
                match message.parts.as_mut().and_then(|parts| parts.last_mut()) {
                    Some(Part::Text { text }) => text.push_str(&delta),
                    _ => message.push_part(Part::Text { text: delta }),
                }
            }
            DataStreamPart::Reasoning(delta) => {
                let message = self.message(messages, None);
                match message.parts.as_mut().and_then(|parts| parts.last_mut()) {
                    Some(Part::Reasoning { reasoning }) => reasoning.push_str(&delta),
                    _ => message.push_part(Part::Reasoning { reasoning: delta }),
                }
            }
            DataStreamPart::Data(values) => data.extend(values),
            DataStreamPart::Annotations(values) => {
                let message = self.message(messages, None);
                for value in values {
                    message.push_annotation(value);
                }
            }
            DataStreamPart::ToolCall {
                tool_call_id,
                tool_name,
                args,
            } => self
                .message(messages, None)
                .push_part(Part::ToolInvocation {
                    tool_invocation: ToolInvocation {
                        state: InvocationState::Call,
                        tool_call_id,
                        tool_name,
                        args,
                        result: None,
                    },
                }),
            DataStreamPart::ToolResult {
                tool_call_id,
                result,
            } => {
                let message = self.message(messages, None);
                if let Some(invocation) = invocation_mut(message, &tool_call_id) {
                    invocation.state = InvocationState::Result;
                    invocation.result = Some(result);
                } else {
                    tracing::warn!("result for unknown tool call {tool_call_id}");
                }
            }
            DataStreamPart::FinishStep(_) => {}
            DataStreamPart::FinishMessage(_) => return Applied::Finished,
            DataStreamPart::Error(message) => return Applied::Failed(message),
        }
        Applied::Updated
    }

    fn current(&self, messages: &[UiMessage]) -> Option<usize> {
        self.index
            .filter(|index| messages.get(*index).is_some_and(|m| m.role == UiRole::Assistant))
    }

    /// The assistant message being written, created on first use.
    fn message<'m>(
        &mut self,
        messages: &'m mut Vec<UiMessage>,
        id: Option<String>,
    ) -> &'m mut UiMessage {
        let index = match self.current(messages) {
            Some(index) => index,
            None => {
                let id = id.unwrap_or_else(|| format!("msg-{}", super::new_id()));
                messages.push(UiMessage::assistant(id, ""));
                messages.len() - 1
            }
        };
        self.index = Some(index);
        &mut messages[index]
    }
}

/// The tool invocation with this call id.
pub(crate) fn invocation_mut<'m>(
    message: &'m mut UiMessage,
    tool_call_id: &str,
) -> Option<&'m mut ToolInvocation> {
    message
        .parts
        .iter_mut()
        .flatten()
        .find_map(|part| match part {
            Part::ToolInvocation { tool_invocation } if tool_invocation.tool_call_id == tool_call_id => {
                Some(tool_invocation)
            }
            _ => None,
        })
}
