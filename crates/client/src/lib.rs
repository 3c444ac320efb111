//! Parley client: the chat session controller plus HTTP access to a
//! parley-gateway.
//!
//! A [`ChatSession`] owns one conversation and drives generations through a
//! [`Transport`]. [`HttpTransport`] talks to the gateway's `/api/chat`
//! endpoint; [`ApiClient`] covers the chat history and super prompt
//! endpoints.

pub use api::ApiClient;
pub use error::SessionError;
pub use session::{ChatSession, ChatStatus, SessionEvent};
pub use transport::{ChatResponse, HttpTransport, PartStream, Transport};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use protocol::ModelSpec;
use reqwest::{Client, Method, RequestBuilder};

/// Characters escaped in cookie values: everything but RFC 3986 unreserved.
const COOKIE_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

mod api;
mod error;
mod session;
mod transport;

/// Connection settings for a parley-gateway.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Gateway base URL, without the `/api` suffix.
    pub base_url: String,
    /// API key sent as a bearer token. Chats are stored anonymously
    /// without one.
    pub api_key: Option<String>,
    /// Model sent in the selected-model cookie.
    pub model: ModelSpec,
    /// Let the model use the search tools.
    pub search_mode: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_owned(),
            api_key: None,
            model: ModelSpec::default(),
            search_mode: true,
        }
    }
}

impl ClientConfig {
    /// Config for a gateway at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the selected model.
    pub fn model(mut self, model: ModelSpec) -> Self {
        self.model = model;
        self
    }

    /// Turn search mode on or off.
    pub fn search_mode(mut self, enabled: bool) -> Self {
        self.search_mode = enabled;
        self
    }

    fn request(&self, client: &Client, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url.trim_end_matches('/'));
        let builder = client.request(method, url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// The `Cookie` header value carrying the model and search mode.
    fn cookie(&self) -> String {
        let model = serde_json::to_string(&self.model).unwrap_or_default();
        format!(
            "{}={}; {}={}",
            protocol::MODEL_COOKIE,
            utf8_percent_encode(&model, COOKIE_VALUE),
            protocol::SEARCH_MODE_COOKIE,
            self.search_mode
        )
    }
}
