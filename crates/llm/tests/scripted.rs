//! Tests for the scripted provider and stream chunk assembly.

use futures_util::StreamExt;
use parley_llm::{
    FinishReason, General, LLM, Message, MessageBuilder, Role, Script, ScriptedProvider,
    StreamChunk, ToolCall,
};

#[tokio::test]
async fn stream_replays_chunks_and_records_request() {
    let provider = ScriptedProvider::new([Script::Chunks(vec![
        StreamChunk::text("hel"),
        StreamChunk::text("lo"),
        StreamChunk::finish(FinishReason::Stop),
    ])]);

    let messages = [Message::user("hi")];
    let chunks: Vec<_> = provider
        .stream(General::default(), &messages, false)
        .collect()
        .await;
    assert_eq!(chunks.len(), 3);

    let mut builder = MessageBuilder::new(Role::Assistant);
    for chunk in chunks {
        builder.accept(&chunk.unwrap());
    }
    assert_eq!(builder.build().content, "hello");

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].1[0].content, "hi");
    assert_eq!(provider.dropped(), 0);
}

#[tokio::test]
async fn builder_merges_tool_call_fragments() {
    let mut first = ToolCall::function("call_1", "search", "{\"query\":");
    first.index = 0;
    let mut second = ToolCall::default();
    second.function.arguments = "\"rust\"}".into();

    let mut builder = MessageBuilder::new(Role::Assistant);
    builder.accept(&StreamChunk::tool(&[first]));
    builder.accept(&StreamChunk::tool(&[second]));
    let message = builder.build();

    assert_eq!(message.tool_calls.len(), 1);
    assert_eq!(message.tool_calls[0].function.name, "search");
    assert_eq!(message.tool_calls[0].function.arguments, "{\"query\":\"rust\"}");
}

#[tokio::test]
async fn failing_script_surfaces_error_after_chunks() {
    let provider = ScriptedProvider::new([Script::Failing(
        vec![StreamChunk::text("partial")],
        "rate limit exceeded".into(),
    )]);
    let results: Vec<_> = provider
        .stream(General::default(), &[], false)
        .collect()
        .await;
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    let err = results[1].as_ref().unwrap_err();
    assert!(err.to_string().contains("rate limit"));
}

#[tokio::test]
async fn dropping_a_stalled_stream_is_counted() {
    let provider = ScriptedProvider::new([Script::Stalled(vec![StreamChunk::text("a")])]);
    {
        let mut stream = Box::pin(provider.stream(General::default(), &[], false));
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.content(), Some("a"));
    }
    assert_eq!(provider.dropped(), 1);
}

#[tokio::test]
async fn send_replies_in_order() {
    let provider = ScriptedProvider::new([
        Script::Reply("one".into()),
        Script::ReplyError("timeout".into()),
    ]);
    let first = provider.send(&General::default(), &[]).await.unwrap();
    assert_eq!(first.content().map(String::as_str), Some("one"));
    assert!(provider.send(&General::default(), &[]).await.is_err());
    assert!(provider.send(&General::default(), &[]).await.is_err());
}

#[test]
fn chunk_deserializes_openai_delta() {
    let chunk: StreamChunk = serde_json::from_str(
        r#"{"id":"c1","object":"chat.completion.chunk","created":1,"model":"gpt-4o",
            "choices":[{"index":0,"delta":{"content":"Hi"},"finish_reason":null}]}"#,
    )
    .unwrap();
    assert_eq!(chunk.content(), Some("Hi"));

    let done: StreamChunk = serde_json::from_str(
        r#"{"choices":[{"index":0,"delta":{},"finish_reason":"tool_calls"}]}"#,
    )
    .unwrap();
    assert_eq!(done.reason(), Some(&FinishReason::ToolCalls));
}
