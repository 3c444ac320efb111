//! HTTP API request and response bodies.

use crate::UiMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Full message history, newest last.
    pub messages: Vec<UiMessage>,
    /// Chat id, or `"new"`.
    pub id: String,
}

/// A stored chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    /// Chat id.
    pub id: String,
    /// First user message, truncated.
    pub title: String,
    /// Client route for the chat.
    pub path: String,
    /// When the chat was first saved.
    pub created_at: DateTime<Utc>,
    /// Owner.
    pub user_id: String,
    /// Persisted messages, including data annotations.
    #[serde(default)]
    pub messages: Vec<UiMessage>,
}

/// Body of `GET /api/chats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPage {
    /// Chats, newest first.
    pub chats: Vec<Chat>,
    /// Offset of the next page, `null` when this is the last one.
    pub next_offset: Option<usize>,
}

/// Body of `DELETE /api/chat/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Always `true` on success.
    pub success: bool,
}

/// Body of `POST /api/generate-super-prompt`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuperPromptRequest {
    /// The user's rough request. `null` and a missing field both count
    /// as no input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// Stream the prompt as plain text instead of JSON.
    #[serde(default)]
    pub stream: bool,
}

/// Successful super prompt response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperPromptResponse {
    /// The crafted prompt.
    pub prompt: String,
}

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// User-facing message.
    pub error: String,
}

impl ErrorBody {
    /// An error body with the given message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
