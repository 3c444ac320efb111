//! UI message and API body serialization tests.

use parley_protocol::{
    Chat, ChatPage, InvocationState, ModelSpec, Part, ReasoningData, RelatedQuestion,
    RelatedQuestions, StreamAnnotation, SuperPromptRequest, ToolCallType, ToolInvocation,
    UiMessage, UiRole,
};
use serde_json::json;

#[test]
fn message_with_parts_deserializes() {
    let message: UiMessage = serde_json::from_value(json!({
        "id": "m1",
        "role": "assistant",
        "content": "Answer",
        "parts": [
            { "type": "step-start" },
            { "type": "reasoning", "reasoning": "think" },
            { "type": "tool-invocation", "toolInvocation": {
                "state": "result",
                "toolCallId": "call_1",
                "toolName": "search",
                "args": { "query": "rust" },
                "result": { "results": [] }
            }},
            { "type": "source", "source": {} },
            { "type": "text", "text": "Answer" }
        ]
    }))
    .unwrap();

    assert_eq!(message.role, UiRole::Assistant);
    assert_eq!(message.reasoning(), "think");
    let calls: Vec<_> = message.tool_invocations().collect();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].state, InvocationState::Result);
    assert_eq!(message.parts.as_ref().unwrap()[3], Part::Unknown);
}

#[test]
fn data_message_keeps_json_content_as_text() {
    let message: UiMessage = serde_json::from_value(json!({
        "id": "d1",
        "role": "data",
        "content": { "type": "reasoning", "data": { "time": 5 } }
    }))
    .unwrap();
    let content: serde_json::Value = serde_json::from_str(&message.content).unwrap();
    assert_eq!(content["data"]["time"], 5);
}

#[test]
fn minimal_message_skips_optional_fields() {
    let value = serde_json::to_value(UiMessage::user("u1", "hi")).unwrap();
    assert_eq!(value, json!({ "id": "u1", "role": "user", "content": "hi" }));
}

#[test]
fn annotations_use_type_and_data() {
    let reasoning = StreamAnnotation::Reasoning(ReasoningData {
        time: 1200,
        reasoning: None,
    });
    assert_eq!(
        reasoning.to_value(),
        json!({ "type": "reasoning", "data": { "time": 1200 } })
    );

    let related = StreamAnnotation::RelatedQuestions(RelatedQuestions {
        items: vec![RelatedQuestion {
            query: "What next?".into(),
        }],
    });
    assert_eq!(
        related.to_value(),
        json!({ "type": "related-questions", "data": { "items": [{ "query": "What next?" }] } })
    );

    let call = StreamAnnotation::ToolCall(ToolInvocation {
        state: InvocationState::Call,
        tool_call_id: "c".into(),
        tool_name: "search".into(),
        args: json!({}),
        result: None,
    });
    assert_eq!(call.to_value()["type"], "tool_call");
    assert_eq!(call.to_value()["data"]["state"], "call");
}

#[test]
fn model_spec_defaults() {
    let spec = ModelSpec::default();
    assert_eq!(spec.qualified_id(), "openai:gpt-4o-mini");
    assert_eq!(spec.tool_call_type, ToolCallType::Native);

    let manual: ModelSpec = serde_json::from_value(json!({
        "id": "deepseek-reasoner",
        "providerId": "deepseek",
        "toolCallType": "manual",
        "toolCallModel": "deepseek-chat"
    }))
    .unwrap();
    assert!(manual.enabled);
    assert_eq!(manual.tool_call_type, ToolCallType::Manual);
    assert_eq!(manual.tool_call_model(), "deepseek-chat");
}

#[test]
fn chat_page_serializes_null_next_offset() {
    let page = ChatPage::default();
    assert_eq!(
        serde_json::to_value(page).unwrap(),
        json!({ "chats": [], "nextOffset": null })
    );
}

#[test]
fn chat_uses_camel_case() {
    let chat = Chat {
        id: "c1".into(),
        title: "hi".into(),
        path: "/search/c1".into(),
        created_at: chrono::DateTime::from_timestamp(0, 0).unwrap(),
        user_id: "anonymous".into(),
        messages: Vec::new(),
    };
    let value = serde_json::to_value(&chat).unwrap();
    assert_eq!(value["userId"], "anonymous");
    assert_eq!(value["createdAt"], "1970-01-01T00:00:00Z");
}

#[test]
fn super_prompt_input_may_be_null() {
    let request: SuperPromptRequest = serde_json::from_value(json!({ "input": null })).unwrap();
    assert_eq!(request.input, None);
    let request: SuperPromptRequest = serde_json::from_value(json!({ "stream": true })).unwrap();
    assert_eq!((request.input, request.stream), (None, true));
}
