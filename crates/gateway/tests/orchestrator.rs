//! Stream orchestrator tests against a scripted provider.

mod common;

use common::{FakeSearch, TestHook, quiet_settings, text_script};
use futures_util::StreamExt;
use llm::{FinishReason, Role, Script, ScriptedProvider, StreamChunk, ToolCall};
use parley_gateway::{ChatTurn, Orchestrator, ToolSet, config::ChatConfig};
use pcore::{ErrorKind, InMemoryStore, Store};
use protocol::{
    DataStreamPart, InvocationState, ModelSpec, ToolCallType, UiMessage, UiRole,
};
use serde_json::{Value, json};
use std::sync::Arc;

struct Fixture {
    provider: ScriptedProvider,
    store: Arc<InMemoryStore>,
    tools: Arc<ToolSet<FakeSearch>>,
    orchestrator: Orchestrator<TestHook>,
}

fn fixture(scripts: Vec<Script>, settings: ChatConfig) -> Fixture {
    let provider = ScriptedProvider::new(scripts);
    let store = Arc::new(InMemoryStore::new());
    let tools = Arc::new(ToolSet::new(FakeSearch::default(), 5));
    let orchestrator = Orchestrator::<TestHook>::new(
        provider.clone(),
        Arc::clone(&store),
        Arc::clone(&tools),
        settings,
    );
    Fixture {
        provider,
        store,
        tools,
        orchestrator,
    }
}

fn turn(content: &str, search_mode: bool) -> ChatTurn {
    ChatTurn {
        messages: vec![UiMessage::user("u1", content)],
        model: ModelSpec::default(),
        chat_id: "chat-1".into(),
        search_mode,
        user_id: "anonymous".into(),
    }
}

async fn collect(orchestrator: Orchestrator<TestHook>, turn: ChatTurn) -> Vec<DataStreamPart> {
    orchestrator.run(turn).collect().await
}

fn codes(parts: &[DataStreamPart]) -> String {
    parts.iter().map(DataStreamPart::code).collect()
}

fn search_call(id: &str, query: &str) -> Script {
    let call = ToolCall::function(id, "search", json!({ "query": query }).to_string());
    Script::Chunks(vec![
        StreamChunk::tool(&[call]),
        StreamChunk::finish(FinishReason::ToolCalls),
    ])
}

#[tokio::test]
async fn plain_answer_with_related_questions() {
    let related = r#"{"items": [{"query": "a"}, {"query": "b"}, {"query": "c"}]}"#;
    let fx = fixture(
        vec![
            text_script(&["Hello", " world"]),
            Script::Reply(related.into()),
        ],
        ChatConfig::default(),
    );

    let parts = collect(fx.orchestrator, turn("hi", false)).await;
    assert_eq!(codes(&parts), "f00e8d");
    assert_eq!(parts[1], DataStreamPart::Text("Hello".into()));

    let DataStreamPart::Annotations(annotations) = &parts[4] else {
        panic!("expected annotations, got {:?}", parts[4]);
    };
    assert_eq!(annotations[0]["type"], "related-questions");
    assert_eq!(annotations[0]["data"]["items"][2]["query"], "c");

    let chat = fx
        .store
        .get_chat("chat-1", "anonymous")
        .await
        .unwrap()
        .expect("chat saved");
    assert_eq!(chat.title, "hi");
    assert_eq!(chat.path, "/search/chat-1");
    let roles: Vec<_> = chat.messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![UiRole::User, UiRole::Assistant, UiRole::Data]);
    assert_eq!(chat.messages[1].content, "Hello world");
}

#[tokio::test]
async fn search_mode_off_sends_no_tools() {
    let fx = fixture(vec![text_script(&["ok"])], quiet_settings());
    collect(fx.orchestrator, turn("hi", false)).await;

    let requests = fx.provider.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].0.tools.is_none());
    assert_eq!(requests[0].1[0].role, Role::System);
}

#[tokio::test]
async fn native_tool_call_runs_and_continues() {
    let fx = fixture(
        vec![search_call("call_1", "rust"), text_script(&["Rust is great"])],
        quiet_settings(),
    );

    let parts = collect(fx.orchestrator, turn("what is rust", true)).await;
    assert_eq!(codes(&parts), "f9aef0ed");
    assert_eq!(
        parts[1],
        DataStreamPart::ToolCall {
            tool_call_id: "call_1".into(),
            tool_name: "search".into(),
            args: json!({ "query": "rust" }),
        }
    );
    let DataStreamPart::ToolResult { result, .. } = &parts[2] else {
        panic!("expected tool result");
    };
    assert_eq!(result["results"][0]["url"], "https://www.rust-lang.org");
    let DataStreamPart::FinishStep(step) = &parts[3] else {
        panic!("expected finish step");
    };
    assert_eq!(step.finish_reason, "tool-calls");
    assert_eq!(step.is_continued, Some(true));

    let queries = fx.tools.backend().queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].query, "rust");
    assert_eq!(queries[0].max_results, Some(5));

    let requests = fx.provider.requests();
    assert_eq!(requests.len(), 2);
    let names: Vec<_> = requests[0]
        .0
        .tools
        .iter()
        .flatten()
        .map(|tool| tool.name.to_string())
        .collect();
    assert_eq!(names, vec!["search", "retrieve", "ask_question"]);
    let tool_reply = requests[1].1.last().unwrap();
    assert_eq!(tool_reply.role, Role::Tool);
    assert_eq!(tool_reply.tool_call_id, "call_1");

    let chat = fx
        .store
        .get_chat("chat-1", "anonymous")
        .await
        .unwrap()
        .unwrap();
    let invocation = chat.messages[1].tool_invocations().next().unwrap();
    assert_eq!(invocation.state, InvocationState::Result);
}

#[tokio::test]
async fn ask_question_ends_the_run() {
    let args = json!({ "question": "Which Rust?", "options": [{"value": "lang", "label": "The language"}] });
    let call = ToolCall::function("call_q", "ask_question", args.to_string());
    let fx = fixture(
        vec![Script::Chunks(vec![
            StreamChunk::tool(&[call]),
            StreamChunk::finish(FinishReason::ToolCalls),
        ])],
        ChatConfig::default(),
    );

    let parts = collect(fx.orchestrator, turn("tell me about rust", true)).await;
    assert_eq!(codes(&parts), "f9ed");
    // no related-questions request after an ask_question call
    assert_eq!(fx.provider.requests().len(), 1);
    assert!(fx.tools.backend().queries.lock().unwrap().is_empty());

    let chat = fx
        .store
        .get_chat("chat-1", "anonymous")
        .await
        .unwrap()
        .unwrap();
    let invocation = chat.messages[1].tool_invocations().next().unwrap();
    assert_eq!(invocation.tool_name, "ask_question");
    assert_eq!(invocation.state, InvocationState::Call);
}

#[tokio::test]
async fn manual_prepass_splices_tool_result() {
    let fx = fixture(
        vec![
            Script::Reply(r#"{"tool": "search", "parameters": {"query": "news"}}"#.into()),
            text_script(&["Answer"]),
        ],
        ChatConfig::default(),
    );
    let mut turn = turn("latest news", true);
    turn.model.tool_call_type = ToolCallType::Manual;
    turn.model.tool_call_model = Some("gpt-4o-mini-tools".into());

    let parts = collect(fx.orchestrator, turn).await;
    assert_eq!(codes(&parts), "28f0ed");

    let DataStreamPart::Data(call) = &parts[0] else {
        panic!("expected data part");
    };
    assert_eq!(call[0]["type"], "tool_call");
    assert_eq!(call[0]["data"]["state"], "call");
    let DataStreamPart::Annotations(result) = &parts[1] else {
        panic!("expected annotation part");
    };
    assert_eq!(result[0]["data"]["state"], "result");
    assert_eq!(result[0]["data"]["toolName"], "search");

    let requests = fx.provider.requests();
    // selection, generation, and no related questions for manual runs
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].0.model, "gpt-4o-mini-tools");
    let (config, messages) = &requests[1];
    assert!(config.tools.is_none());
    let tail: Vec<_> = messages[messages.len() - 2..]
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .collect();
    assert_eq!(tail[1], (Role::User, "Now answer the user question."));
    assert!(tail[0].1.starts_with("Tool call result: "));

    let chat = fx
        .store
        .get_chat("chat-1", "anonymous")
        .await
        .unwrap()
        .unwrap();
    let data: Value = serde_json::from_str(&chat.messages[2].content).unwrap();
    assert_eq!(data["type"], "tool_call");
}

#[tokio::test]
async fn manual_without_search_skips_prepass() {
    let fx = fixture(vec![text_script(&["Answer"])], ChatConfig::default());
    let mut turn = turn("hello", false);
    turn.model.tool_call_type = ToolCallType::Manual;

    let parts = collect(fx.orchestrator, turn).await;
    assert_eq!(codes(&parts), "f0ed");
    assert_eq!(fx.provider.requests().len(), 1);
}

#[tokio::test]
async fn reasoning_span_is_annotated_and_persisted() {
    let fx = fixture(
        vec![Script::Chunks(vec![
            StreamChunk::reasoning("let me "),
            StreamChunk::reasoning("think"),
            StreamChunk::text("42"),
            StreamChunk::finish(FinishReason::Stop),
        ])],
        quiet_settings(),
    );

    let parts = collect(fx.orchestrator, turn("answer?", false)).await;
    assert_eq!(codes(&parts), "fgg80ed");
    let DataStreamPart::Annotations(timing) = &parts[3] else {
        panic!("expected reasoning annotation");
    };
    assert_eq!(timing[0]["type"], "reasoning");
    assert!(timing[0]["data"]["time"].is_u64());
    assert!(timing[0]["data"].get("reasoning").is_none());

    let chat = fx
        .store
        .get_chat("chat-1", "anonymous")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(chat.messages[1].reasoning(), "let me think");
    let data: Value = serde_json::from_str(&chat.messages[2].content).unwrap();
    assert_eq!(data["type"], "reasoning");
    assert_eq!(data["data"]["reasoning"], "let me think");
}

#[tokio::test]
async fn reasoning_left_open_closes_with_the_step() {
    let fx = fixture(
        vec![Script::Chunks(vec![StreamChunk::reasoning("pondering")])],
        quiet_settings(),
    );

    let parts = collect(fx.orchestrator, turn("answer?", false)).await;
    assert_eq!(codes(&parts), "fg8ed");
    let DataStreamPart::Annotations(timing) = &parts[2] else {
        panic!("expected reasoning annotation");
    };
    assert_eq!(timing[0]["type"], "reasoning");

    let chat = fx
        .store
        .get_chat("chat-1", "anonymous")
        .await
        .unwrap()
        .unwrap();
    let data: Value = serde_json::from_str(&chat.messages[2].content).unwrap();
    assert_eq!(data["type"], "reasoning");
    assert!(data["data"]["time"].is_u64());
    assert_eq!(data["data"]["reasoning"], "pondering");
}

#[tokio::test]
async fn reasoning_models_skip_related_questions() {
    let fx = fixture(vec![text_script(&["done"])], ChatConfig::default());
    let mut turn = turn("hi", false);
    turn.model.id = "o3-mini".into();

    let parts = collect(fx.orchestrator, turn).await;
    assert_eq!(codes(&parts), "f0ed");
    assert_eq!(fx.provider.requests().len(), 1);
}

#[tokio::test]
async fn related_question_failure_is_not_fatal() {
    let fx = fixture(
        vec![text_script(&["done"]), Script::ReplyError("boom".into())],
        ChatConfig::default(),
    );
    let parts = collect(fx.orchestrator, turn("hi", false)).await;
    assert_eq!(codes(&parts), "f0ed");
    assert_eq!(fx.store.len(), 1);
}

#[tokio::test]
async fn provider_error_becomes_error_part() {
    let fx = fixture(
        vec![Script::Failing(
            vec![StreamChunk::text("partial")],
            "429 rate limit exceeded".into(),
        )],
        quiet_settings(),
    );

    let parts = collect(fx.orchestrator, turn("hi", false)).await;
    assert_eq!(codes(&parts), "f03");
    assert_eq!(
        parts[2],
        DataStreamPart::Error(ErrorKind::RateLimit.user_message().into())
    );
    assert!(fx.store.is_empty());
}

#[tokio::test]
async fn oversized_input_fails_before_calling_provider() {
    let fx = fixture(Vec::new(), quiet_settings());
    let parts = collect(fx.orchestrator, turn(&"x".repeat(600_000), false)).await;
    assert_eq!(
        parts,
        vec![DataStreamPart::Error(
            ErrorKind::Generic.user_message().into()
        )]
    );
    assert!(fx.provider.requests().is_empty());
}

#[tokio::test]
async fn dropping_the_stream_aborts_without_saving() {
    let fx = fixture(
        vec![Script::Stalled(vec![StreamChunk::text("partial")])],
        quiet_settings(),
    );

    let mut stream = Box::pin(fx.orchestrator.run(turn("hi", false)));
    assert!(matches!(stream.next().await, Some(DataStreamPart::StartStep { .. })));
    assert_eq!(
        stream.next().await,
        Some(DataStreamPart::Text("partial".into()))
    );
    drop(stream);

    assert_eq!(fx.provider.dropped(), 1);
    assert!(fx.store.is_empty());
}

#[tokio::test]
async fn history_off_skips_persistence() {
    let settings = ChatConfig {
        save_history: false,
        ..quiet_settings()
    };
    let fx = fixture(vec![text_script(&["ok"])], settings);
    let parts = collect(fx.orchestrator, turn("hi", false)).await;
    assert_eq!(codes(&parts), "f0ed");
    assert!(fx.store.is_empty());
}

#[tokio::test]
async fn step_budget_forces_an_answer() {
    let settings = ChatConfig {
        max_steps: 2,
        ..quiet_settings()
    };
    let fx = fixture(
        vec![search_call("call_1", "a"), text_script(&["final"])],
        settings,
    );
    let parts = collect(fx.orchestrator, turn("q", true)).await;
    assert_eq!(codes(&parts), "f9aef0ed");

    let requests = fx.provider.requests();
    assert_eq!(requests[0].0.tool_choice, None);
    assert_eq!(requests[1].0.tool_choice, Some(llm::ToolChoice::None));
}

#[test]
fn answered_invocations_become_tool_messages() {
    let assistant: UiMessage = serde_json::from_value(json!({
        "id": "a1",
        "role": "assistant",
        "content": "Here is what I found",
        "parts": [
            {"type": "step-start"},
            {"type": "tool-invocation", "toolInvocation": {
                "state": "result", "toolCallId": "c1", "toolName": "search",
                "args": {"query": "rust"}, "result": {"results": []}
            }},
            {"type": "tool-invocation", "toolInvocation": {
                "state": "call", "toolCallId": "c2", "toolName": "ask_question",
                "args": {"question": "?"}
            }},
            {"type": "text", "text": "Here is what I found"}
        ]
    }))
    .unwrap();
    let data = UiMessage::data("d1", &json!({"type": "reasoning", "data": {"time": 1}}));
    let messages = parley_gateway::orchestrator::to_provider(&[
        UiMessage::user("u1", "rust?"),
        assistant,
        data,
    ]);

    let roles: Vec<_> = messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]
    );
    assert_eq!(messages[1].tool_calls.len(), 1);
    assert_eq!(messages[1].tool_calls[0].id, "c1");
    assert_eq!(messages[2].tool_call_id, "c1");
    assert_eq!(messages[3].content, "Here is what I found");
}
