//! Assembly of the assistant message persisted after a run.

use protocol::{InvocationState, Part, ToolInvocation, UiMessage};
use serde_json::Value;

/// The assistant message being produced, plus annotations to persist as
/// data messages after it.
#[derive(Debug)]
pub struct Reply {
    message: UiMessage,
    annotations: Vec<Value>,
}

impl Reply {
    /// An empty reply with the given message id.
    pub fn new(id: impl Into<String>) -> Self {
        let mut message = UiMessage::assistant(id, "");
        message.created_at = Some(chrono::Utc::now().to_rfc3339());
        Self {
            message,
            annotations: Vec::new(),
        }
    }

    /// Id of the assistant message.
    pub fn id(&self) -> &str {
        &self.message.id
    }

    /// Mark the start of a generation step.
    pub fn step_start(&mut self) {
        self.message.push_part(Part::StepStart);
    }

    /// Append a reasoning delta.
    pub fn reasoning(&mut self, delta: &str) {
        if let Some(Part::Reasoning { reasoning }) = self.last_part() {
            reasoning.push_str(delta);
            return;
        }
        self.message.push_part(Part::Reasoning {
            reasoning: delta.to_owned(),
        });
    }

    /// Append a text delta.
    pub fn text(&mut self, delta: &str) {
        self.message.content.push_str(delta);
        if let Some(Part::Text { text }) = self.last_part() {
            text.push_str(delta);
            return;
        }
        self.message.push_part(Part::Text {
            text: delta.to_owned(),
        });
    }

    /// Record a tool call.
    pub fn tool_call(&mut self, id: &str, name: &str, args: Value) {
        self.message.push_part(Part::ToolInvocation {
            tool_invocation: ToolInvocation {
                state: InvocationState::Call,
                tool_call_id: id.to_owned(),
                tool_name: name.to_owned(),
                args,
                result: None,
            },
        });
    }

    /// Attach a result to a recorded tool call.
    pub fn tool_result(&mut self, id: &str, result: Value) {
        let invocation = self.message.parts.iter_mut().flatten().find_map(|part| match part {
            Part::ToolInvocation { tool_invocation } if tool_invocation.tool_call_id == id => {
                Some(tool_invocation)
            }
            _ => None,
        });
        if let Some(invocation) = invocation {
            invocation.state = InvocationState::Result;
            invocation.result = Some(result);
        }
    }

    /// Queue an annotation for persistence.
    pub fn annotate(&mut self, annotation: Value) {
        self.annotations.push(annotation);
    }

    /// Full reasoning text so far.
    pub fn reasoning_text(&self) -> String {
        self.message.reasoning()
    }

    /// The messages to persist: `history`, the assistant message, then one
    /// data message per annotation.
    pub fn into_messages(self, mut history: Vec<UiMessage>) -> Vec<UiMessage> {
        let id = self.message.id.clone();
        history.push(self.message);
        for (idx, annotation) in self.annotations.iter().enumerate() {
            history.push(UiMessage::data(format!("{id}-data-{idx}"), annotation));
        }
        history
    }

    fn last_part(&mut self) -> Option<&mut Part> {
        self.message.parts.as_mut().and_then(|parts| parts.last_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::UiRole;
    use serde_json::json;

    #[test]
    fn deltas_merge_into_parts() {
        let mut reply = Reply::new("m1");
        reply.step_start();
        reply.reasoning("let me ");
        reply.reasoning("think");
        reply.text("hel");
        reply.text("lo");
        let parts = reply.message.parts.clone().unwrap();
        assert_eq!(
            parts,
            vec![
                Part::StepStart,
                Part::Reasoning {
                    reasoning: "let me think".into()
                },
                Part::Text {
                    text: "hello".into()
                },
            ]
        );
        assert_eq!(reply.message.content, "hello");
    }

    #[test]
    fn tool_result_completes_call() {
        let mut reply = Reply::new("m1");
        reply.tool_call("c1", "search", json!({"query": "rust"}));
        reply.tool_result("c1", json!({"results": []}));
        let invocation = reply.message.tool_invocations().next().unwrap();
        assert_eq!(invocation.state, InvocationState::Result);
        assert_eq!(invocation.result, Some(json!({"results": []})));
    }

    #[test]
    fn annotations_follow_assistant() {
        let mut reply = Reply::new("m1");
        reply.text("answer");
        reply.annotate(json!({"type": "reasoning", "data": {"time": 3}}));
        let messages = reply.into_messages(vec![UiMessage::user("u1", "q")]);
        let roles: Vec<_> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![UiRole::User, UiRole::Assistant, UiRole::Data]);
        let data: Value = serde_json::from_str(&messages[2].content).unwrap();
        assert_eq!(data, json!({"type": "reasoning", "data": {"time": 3}}));
    }
}
