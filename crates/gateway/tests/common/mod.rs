//! Shared fixtures for gateway tests.
#![allow(dead_code)]

use anyhow::Result;
use llm::{FinishReason, ScriptedProvider, StreamChunk};
use parley_gateway::{
    ApiKeyAuthenticator, Gateway, Hook, ProviderRegistry, SearchBackend, SuperPrompt, ToolSet,
    config::{ChatConfig, SuperPromptConfig},
    tools::{SearchArgs, SearchResult, SearchResults},
};
use pcore::InMemoryStore;
use std::{
    collections::BTreeMap,
    future::Future,
    sync::{Arc, Mutex},
};

/// Hook wiring the scripted provider, in-memory store, and fake search.
pub struct TestHook;

impl Hook for TestHook {
    type Provider = ScriptedProvider;
    type Store = InMemoryStore;
    type Search = FakeSearch;
}

/// Search backend answering every query with one fixed hit.
#[derive(Default)]
pub struct FakeSearch {
    pub queries: Mutex<Vec<SearchArgs>>,
}

impl SearchBackend for FakeSearch {
    fn search(&self, args: &SearchArgs) -> impl Future<Output = Result<SearchResults>> + Send {
        self.queries.lock().unwrap().push(args.clone());
        let results = SearchResults {
            query: args.query.clone(),
            results: vec![SearchResult {
                title: "Rust".into(),
                url: "https://www.rust-lang.org".into(),
                content: "A language empowering everyone".into(),
            }],
            images: Vec::new(),
        };
        std::future::ready(Ok(results))
    }

    fn retrieve(&self, url: &str) -> impl Future<Output = Result<SearchResults>> + Send {
        let results = SearchResults {
            query: url.to_owned(),
            results: Vec::new(),
            images: Vec::new(),
        };
        std::future::ready(Ok(results))
    }
}

/// Chat settings with related questions off, so scripts stay short.
pub fn quiet_settings() -> ChatConfig {
    ChatConfig {
        related_questions: false,
        ..ChatConfig::default()
    }
}

/// A text-only stream script.
pub fn text_script(parts: &[&str]) -> llm::Script {
    let mut chunks: Vec<StreamChunk> = parts.iter().map(|part| StreamChunk::text(*part)).collect();
    chunks.push(StreamChunk::finish(FinishReason::Stop));
    llm::Script::Chunks(chunks)
}

/// A gateway over `provider` registered as `openai`, with one API key
/// (`key-1` for `alice`).
pub fn gateway(
    provider: ScriptedProvider,
    settings: ChatConfig,
) -> (Gateway<TestHook, ApiKeyAuthenticator>, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let providers = ProviderRegistry::new().with("openai", provider.clone());
    let keys = BTreeMap::from([("key-1".into(), "alice".into())]);
    let gateway = Gateway {
        providers: Arc::new(providers),
        store: Arc::clone(&store),
        tools: Arc::new(ToolSet::new(FakeSearch::default(), 5)),
        super_prompt: Arc::new(SuperPrompt::new(Some(provider), SuperPromptConfig::default())),
        chat: Arc::new(settings),
        authenticator: Arc::new(ApiKeyAuthenticator::new(keys)),
    };
    (gateway, store)
}
