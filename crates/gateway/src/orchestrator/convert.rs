//! UI history to provider messages.

use llm::{Message, ToolCall};
use protocol::{InvocationState, ToolInvocation, UiMessage, UiRole};

/// Convert UI messages into provider messages.
///
/// Data messages are dropped. Tool invocations that carry a result become
/// an assistant tool-call message followed by one tool message per call;
/// invocations still waiting for a result are left out, since providers
/// reject unanswered calls.
pub fn to_provider(messages: &[UiMessage]) -> Vec<Message> {
    let mut out = Vec::with_capacity(messages.len());
    for message in messages {
        match message.role {
            UiRole::Data => {}
            UiRole::System => out.push(Message::system(message.content.as_str())),
            UiRole::User => out.push(Message::user(message.content.as_str())),
            UiRole::Assistant => {
                let answered: Vec<&ToolInvocation> = message
                    .tool_invocations()
                    .filter(|invocation| {
                        invocation.state == InvocationState::Result && invocation.result.is_some()
                    })
                    .collect();

                if !answered.is_empty() {
                    out.push(Message::tool_calls(answered.iter().map(|invocation| {
                        ToolCall::function(
                            invocation.tool_call_id.as_str(),
                            invocation.tool_name.as_str(),
                            invocation.args.to_string(),
                        )
                    })));
                    for invocation in answered {
                        let result = invocation
                            .result
                            .as_ref()
                            .map(|result| result.to_string())
                            .unwrap_or_default();
                        out.push(Message::tool(result, invocation.tool_call_id.as_str()));
                    }
                }

                if !message.content.is_empty() {
                    out.push(Message::assistant(message.content.as_str()));
                }
            }
        }
    }
    out
}
