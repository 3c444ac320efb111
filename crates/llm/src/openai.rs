//! OpenAI-compatible provider.
//!
//! Covers OpenAI, DeepSeek, xAI, Groq, Fireworks, Ollama, and any other
//! service exposing the OpenAI chat completions API.

use crate::{Client, General, HttpProvider, LLM, Message, Request, Response, StreamChunk};
use anyhow::Result;
use futures_core::Stream;

/// OpenAI-compatible endpoint URLs.
pub mod endpoint {
    /// OpenAI chat completions.
    pub const OPENAI: &str = "https://api.openai.com/v1/chat/completions";
    /// DeepSeek chat completions.
    pub const DEEPSEEK: &str = "https://api.deepseek.com/chat/completions";
    /// xAI (Grok) chat completions.
    pub const XAI: &str = "https://api.x.ai/v1/chat/completions";
    /// Groq chat completions.
    pub const GROQ: &str = "https://api.groq.com/openai/v1/chat/completions";
    /// Fireworks chat completions.
    pub const FIREWORKS: &str = "https://api.fireworks.ai/inference/v1/chat/completions";
    /// Ollama local chat completions.
    pub const OLLAMA: &str = "http://localhost:11434/v1/chat/completions";
}

/// An OpenAI-compatible provider.
#[derive(Clone)]
pub struct OpenAI {
    http: HttpProvider,
}

impl OpenAI {
    /// Create a provider targeting the OpenAI API.
    pub fn api(client: Client, key: &str) -> Result<Self> {
        Self::custom(client, key, endpoint::OPENAI)
    }

    /// Create a provider targeting a local Ollama instance (no API key).
    pub fn ollama(client: Client, endpoint: Option<&str>) -> Self {
        Self {
            http: HttpProvider::no_auth(client, endpoint.unwrap_or(endpoint::OLLAMA)),
        }
    }

    /// Create a provider targeting a custom OpenAI-compatible endpoint.
    pub fn custom(client: Client, key: &str, endpoint: &str) -> Result<Self> {
        Ok(Self {
            http: HttpProvider::bearer(client, key, endpoint)?,
        })
    }

    /// The chat completions URL this provider talks to.
    pub fn endpoint(&self) -> &str {
        self.http.endpoint()
    }
}

impl LLM for OpenAI {
    async fn send(&self, config: &General, messages: &[Message]) -> Result<Response> {
        let body = Request::new(config.clone(), messages);
        self.http.send(&body).await
    }

    fn stream(
        &self,
        config: General,
        messages: &[Message],
        usage: bool,
    ) -> impl Stream<Item = Result<StreamChunk>> + Send {
        let body = Request::new(config, messages).streaming(usage);
        self.http.stream_sse(&body)
    }
}
