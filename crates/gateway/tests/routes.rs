//! HTTP route tests over a real listener.

mod common;

use chrono::{TimeZone, Utc};
use common::{gateway, quiet_settings, text_script};
use llm::{Script, ScriptedProvider, StreamChunk};
use parley_gateway::{ServeHandle, serve_gateway};
use pcore::{InMemoryStore, Store};
use protocol::{Chat, ChatPage, DataStreamPart, UiMessage};
use serde_json::{Value, json};
use std::sync::Arc;

struct Server {
    handle: ServeHandle,
    store: Arc<InMemoryStore>,
    client: reqwest::Client,
}

impl Server {
    async fn start(scripts: Vec<Script>) -> Self {
        let (gateway, store) = gateway(ScriptedProvider::new(scripts), quiet_settings());
        let handle = serve_gateway(gateway, "127.0.0.1:0").await.unwrap();
        Self {
            handle,
            store,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{path}", self.handle.port)
    }

    async fn stop(self) {
        self.handle.shutdown().await.unwrap();
    }
}

fn chat_body(id: &str) -> Value {
    json!({ "id": id, "messages": [{ "id": "u1", "role": "user", "content": "hi" }] })
}

fn stored_chat(id: &str, user: &str, minute: u32) -> Chat {
    Chat {
        id: id.into(),
        title: id.into(),
        path: format!("/search/{id}"),
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, minute, 0).unwrap(),
        user_id: user.into(),
        messages: vec![UiMessage::user("u1", id)],
    }
}

#[tokio::test]
async fn new_chat_gets_fresh_id_and_streams() {
    let server = Server::start(vec![text_script(&["hi ", "there"])]).await;

    let response = server
        .client
        .post(server.url("/api/chat"))
        .json(&chat_body("new"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let chat_id = response.headers()["x-chat-id"].to_str().unwrap().to_owned();
    assert_ne!(chat_id, "new");
    assert!(!chat_id.is_empty());
    assert_eq!(response.headers()["x-vercel-ai-data-stream"], "v1");
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );

    let body = response.text().await.unwrap();
    let parts: Vec<DataStreamPart> = body
        .lines()
        .map(|line| DataStreamPart::parse_line(line).unwrap())
        .collect();
    assert_eq!(parts[1], DataStreamPart::Text("hi ".into()));
    assert!(matches!(parts.last(), Some(DataStreamPart::FinishMessage(_))));

    let saved = server
        .store
        .get_chat(&chat_id, "anonymous")
        .await
        .unwrap()
        .expect("chat saved under the fresh id");
    assert_eq!(saved.messages[1].content, "hi there");
    server.stop().await;
}

#[tokio::test]
async fn existing_chat_id_is_echoed() {
    let server = Server::start(vec![text_script(&["ok"])]).await;
    let response = server
        .client
        .post(server.url("/api/chat"))
        .json(&chat_body("abc123"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["x-chat-id"], "abc123");
    response.text().await.unwrap();
    server.stop().await;
}

#[tokio::test]
async fn disabled_provider_is_not_found() {
    let server = Server::start(Vec::new()).await;
    let response = server
        .client
        .post(server.url("/api/chat"))
        .header(
            "cookie",
            r#"selectedModel={"id":"llama-3.3-70b","providerId":"groq"}"#,
        )
        .json(&chat_body("new"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body = response.text().await.unwrap();
    assert_eq!(body, "Selected provider is not enabled groq");
    server.stop().await;
}

#[tokio::test]
async fn disabled_model_is_not_found() {
    let server = Server::start(Vec::new()).await;
    let response = server
        .client
        .post(server.url("/api/chat"))
        .header(
            "cookie",
            r#"selectedModel={"id":"gpt-4o","providerId":"openai","enabled":false}"#,
        )
        .json(&chat_body("new"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    assert!(response.text().await.unwrap().contains("openai"));
    server.stop().await;
}

#[tokio::test]
async fn share_pages_are_forbidden() {
    let server = Server::start(Vec::new()).await;
    let response = server
        .client
        .post(server.url("/api/chat"))
        .header("referer", "http://localhost:3000/share/abc")
        .json(&chat_body("new"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    assert_eq!(
        response.text().await.unwrap(),
        "Chat API is not available on share pages"
    );
    server.stop().await;
}

#[tokio::test]
async fn malformed_chat_body_is_server_error() {
    let server = Server::start(Vec::new()).await;
    let response = server
        .client
        .post(server.url("/api/chat"))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    assert_eq!(response.text().await.unwrap(), "Error processing your request");
    server.stop().await;
}

#[tokio::test]
async fn chats_are_paged_newest_first() {
    let server = Server::start(Vec::new()).await;
    for (idx, id) in ["a", "b", "c"].into_iter().enumerate() {
        let minute = u32::try_from(idx).unwrap();
        server
            .store
            .save_chat(stored_chat(id, "anonymous", minute))
            .await
            .unwrap();
    }

    let first: ChatPage = server
        .client
        .get(server.url("/api/chats?limit=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<_> = first.chats.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "b"]);
    assert_eq!(first.next_offset, Some(2));

    let last: Value = server
        .client
        .get(server.url("/api/chats?offset=2&limit=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(last["chats"][0]["id"], "a");
    assert_eq!(last["nextOffset"], Value::Null);
    server.stop().await;
}

#[tokio::test]
async fn chats_are_scoped_by_api_key() {
    let server = Server::start(Vec::new()).await;
    server
        .store
        .save_chat(stored_chat("mine", "alice", 0))
        .await
        .unwrap();

    let anonymous: ChatPage = server
        .client
        .get(server.url("/api/chats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(anonymous.chats.is_empty());

    let alice: ChatPage = server
        .client
        .get(server.url("/api/chats"))
        .bearer_auth("key-1")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(alice.chats.len(), 1);

    let rejected = server
        .client
        .get(server.url("/api/chats"))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), 401);
    server.stop().await;
}

#[tokio::test]
async fn load_and_delete_chat() {
    let server = Server::start(Vec::new()).await;
    server
        .store
        .save_chat(stored_chat("c1", "anonymous", 0))
        .await
        .unwrap();

    let loaded: Chat = server
        .client
        .get(server.url("/api/chat/c1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(loaded.messages[0].content, "c1");

    let deleted: Value = server
        .client
        .delete(server.url("/api/chat/c1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deleted, json!({ "success": true }));

    let missing = server
        .client
        .get(server.url("/api/chat/c1"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
    server.stop().await;
}

async fn super_prompt(server: &Server, body: Value) -> (u16, String) {
    let response = server
        .client
        .post(server.url("/api/generate-super-prompt"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.text().await.unwrap())
}

#[tokio::test]
async fn super_prompt_outcomes() {
    let server = Server::start(vec![
        Script::Reply("Context: planning a trip".into()),
        Script::Reply("   ".into()),
        Script::ReplyError("upstream exploded".into()),
    ])
    .await;

    let (status, body) = super_prompt(&server, json!({ "input": "" })).await;
    assert_eq!(status, 400);
    assert_eq!(
        serde_json::from_str::<Value>(&body).unwrap(),
        json!({ "error": "Input is required" })
    );

    for missing in [json!({ "input": null }), json!({ "input": "   " }), json!({})] {
        let (status, body) = super_prompt(&server, missing).await;
        assert_eq!(status, 400);
        assert!(body.contains("Input is required"));
    }

    let (status, body) = super_prompt(&server, json!({ "input": "plan a trip" })).await;
    assert_eq!(status, 200);
    assert_eq!(
        serde_json::from_str::<Value>(&body).unwrap(),
        json!({ "prompt": "Context: planning a trip" })
    );

    let (status, body) = super_prompt(&server, json!({ "input": "plan a trip" })).await;
    assert_eq!(status, 500);
    assert!(body.contains("No prompt was generated"));

    let (status, body) = super_prompt(&server, json!({ "input": "plan a trip" })).await;
    assert_eq!(status, 500);
    assert!(body.contains("Failed to generate super prompt"));
    server.stop().await;
}

#[tokio::test]
async fn super_prompt_streams_text() {
    let server = Server::start(vec![Script::Chunks(vec![
        StreamChunk::text("Context: "),
        StreamChunk::text("trip"),
    ])])
    .await;
    let (status, body) =
        super_prompt(&server, json!({ "input": "plan a trip", "stream": true })).await;
    assert_eq!(status, 200);
    assert_eq!(body, "Context: trip");
    server.stop().await;
}
