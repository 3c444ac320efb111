//! Chat request transport.

use crate::{ClientConfig, SessionError};
use anyhow::{Context, Result};
use futures_core::Stream;
use futures_util::StreamExt;
use protocol::{CHAT_ID_HEADER, ChatRequest, DataStreamPart, ErrorBody, LineDecoder};
use reqwest::{Client, Method, Response, header};
use std::{future::Future, pin::Pin};

/// Decoded data-stream parts of one chat response.
pub type PartStream = Pin<Box<dyn Stream<Item = Result<DataStreamPart>> + Send>>;

/// A started chat response.
pub struct ChatResponse {
    /// Chat id assigned by the gateway.
    pub chat_id: Option<String>,
    /// The response parts, in order.
    pub parts: PartStream,
}

/// Starts chat generations on behalf of a session.
pub trait Transport: Send + Sync + 'static {
    /// Send the history and return the response stream once the gateway
    /// accepts the request.
    fn chat(
        &self,
        request: ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, SessionError>> + Send;
}

/// [`Transport`] over HTTP to a parley-gateway.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Create a transport with a fresh HTTP client.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Create a transport sharing an existing HTTP client.
    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    /// The connection settings.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Transport for HttpTransport {
    fn chat(
        &self,
        request: ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, SessionError>> + Send {
        let builder = self
            .config
            .request(&self.client, Method::POST, "/api/chat")
            .header(header::COOKIE, self.config.cookie())
            .json(&request);
        async move {
            tracing::debug!("posting chat {} ({} messages)", request.id, request.messages.len());
            let response = builder.send().await.context("failed to connect to gateway")?;
            let response = check(response).await?;
            let chat_id = response
                .headers()
                .get(CHAT_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            Ok(ChatResponse {
                chat_id,
                parts: Box::pin(parts(response.bytes_stream())),
            })
        }
    }
}

/// Pass successful responses through; turn error statuses into
/// [`SessionError::Rejected`] with the body's message.
pub(crate) async fn check(response: Response) -> Result<Response, SessionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|body| body.error)
        .unwrap_or(body);
    Err(SessionError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// Decode a byte stream into data-stream parts.
pub(crate) fn parts<B: AsRef<[u8]> + Send + 'static>(
    bytes: impl Stream<Item = reqwest::Result<B>> + Send + 'static,
) -> impl Stream<Item = Result<DataStreamPart>> + Send + 'static {
    async_stream::try_stream! {
        let mut decoder = LineDecoder::new();
        futures_util::pin_mut!(bytes);
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.context("data stream interrupted")?;
            for part in decoder.push(chunk.as_ref()) {
                tracing::trace!("part: {part:?}");
                yield part?;
            }
        }
        if let Some(part) = decoder.finish() {
            yield part?;
        }
    }
}

/// Decode a byte stream into text, holding back split UTF-8 sequences.
pub(crate) fn text<B: AsRef<[u8]> + Send + 'static>(
    bytes: impl Stream<Item = reqwest::Result<B>> + Send + 'static,
) -> impl Stream<Item = Result<String>> + Send + 'static {
    async_stream::try_stream! {
        let mut pending = Vec::new();
        futures_util::pin_mut!(bytes);
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.context("text stream interrupted")?;
            pending.extend_from_slice(chunk.as_ref());
            let valid = match std::str::from_utf8(&pending) {
                Ok(text) => text.len(),
                Err(err) if err.error_len().is_some() => pending.len(),
                Err(err) => err.valid_up_to(),
            };
            if valid > 0 {
                let rest = pending.split_off(valid);
                let text = String::from_utf8_lossy(&pending).into_owned();
                pending = rest;
                yield text;
            }
        }
        if !pending.is_empty() {
            yield String::from_utf8_lossy(&pending).into_owned();
        }
    }
}
