//! Tests for HttpProvider header construction.

use parley_llm::{HttpProvider, OpenAI, endpoint};

#[test]
fn bearer_sets_authorization_header() {
    let client = parley_llm::Client::new();
    let provider = HttpProvider::bearer(client, "test-key", "http://example.com/v1/chat")
        .expect("bearer provider");

    let auth = provider
        .headers()
        .get("authorization")
        .expect("authorization header");
    assert_eq!(auth.to_str().unwrap(), "Bearer test-key");
    assert_eq!(provider.endpoint(), "http://example.com/v1/chat");
}

#[test]
fn no_auth_omits_authorization_header() {
    let client = parley_llm::Client::new();
    let provider = HttpProvider::no_auth(client, "http://localhost:11434/v1/chat");

    assert!(provider.headers().get("authorization").is_none());
    let ct = provider
        .headers()
        .get("content-type")
        .expect("content-type");
    assert_eq!(ct.to_str().unwrap(), "application/json");
}

#[test]
fn openai_endpoints() {
    let client = parley_llm::Client::new();
    let api = OpenAI::api(client.clone(), "k").unwrap();
    assert_eq!(api.endpoint(), endpoint::OPENAI);

    let ollama = OpenAI::ollama(client.clone(), None);
    assert_eq!(ollama.endpoint(), endpoint::OLLAMA);

    let custom = OpenAI::custom(client, "k", "http://localhost:8080/v1/chat/completions").unwrap();
    assert_eq!(custom.endpoint(), "http://localhost:8080/v1/chat/completions");
}

#[test]
fn bearer_rejects_invalid_header_value() {
    let client = parley_llm::Client::new();
    assert!(HttpProvider::bearer(client, "bad\nkey", "http://example.com").is_err());
}
