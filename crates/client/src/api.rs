//! REST client for chat history and super prompts.

use crate::{
    ClientConfig, SessionError,
    transport::{check, text},
};
use anyhow::{Context, Result};
use futures_core::Stream;
use protocol::{Chat, ChatPage, DeleteResponse, SuperPromptRequest, SuperPromptResponse};
use reqwest::{Client, Method, StatusCode};

/// Client for the gateway's non-streaming endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Create a client with a fresh HTTP client.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Create a client sharing an existing HTTP client.
    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    /// One page of the user's chats, newest first.
    pub async fn list_chats(&self, offset: usize, limit: usize) -> Result<ChatPage, SessionError> {
        let response = self
            .config
            .request(&self.client, Method::GET, "/api/chats")
            .query(&[("offset", offset), ("limit", limit)])
            .send()
            .await
            .context("failed to list chats")?;
        let page = check(response).await?.json().await.context("invalid chat page")?;
        Ok(page)
    }

    /// A stored chat, or `None` if the user has no chat with this id.
    pub async fn get_chat(&self, id: &str) -> Result<Option<Chat>, SessionError> {
        let response = self
            .config
            .request(&self.client, Method::GET, &format!("/api/chat/{id}"))
            .send()
            .await
            .with_context(|| format!("failed to load chat {id}"))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let chat = check(response).await?.json().await.context("invalid chat")?;
        Ok(Some(chat))
    }

    /// Delete a chat.
    pub async fn delete_chat(&self, id: &str) -> Result<bool, SessionError> {
        let response = self
            .config
            .request(&self.client, Method::DELETE, &format!("/api/chat/{id}"))
            .send()
            .await
            .with_context(|| format!("failed to delete chat {id}"))?;
        let body: DeleteResponse = check(response)
            .await?
            .json()
            .await
            .context("invalid delete response")?;
        Ok(body.success)
    }

    /// Turn a rough request into a structured prompt.
    pub async fn super_prompt(&self, input: &str) -> Result<String, SessionError> {
        let body = SuperPromptRequest {
            input: Some(input.to_owned()),
            stream: false,
        };
        let response = self
            .config
            .request(&self.client, Method::POST, "/api/generate-super-prompt")
            .json(&body)
            .send()
            .await
            .context("failed to request super prompt")?;
        let body: SuperPromptResponse = check(response)
            .await?
            .json()
            .await
            .context("invalid super prompt response")?;
        Ok(body.prompt)
    }

    /// Stream a super prompt as it is generated.
    pub async fn super_prompt_stream(
        &self,
        input: &str,
    ) -> Result<impl Stream<Item = Result<String>> + Send + 'static, SessionError> {
        let body = SuperPromptRequest {
            input: Some(input.to_owned()),
            stream: true,
        };
        let response = self
            .config
            .request(&self.client, Method::POST, "/api/generate-super-prompt")
            .json(&body)
            .send()
            .await
            .context("failed to request super prompt")?;
        Ok(text(check(response).await?.bytes_stream()))
    }
}
