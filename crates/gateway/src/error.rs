//! HTTP error responses.
//!
//! Chat route failures answer with plain-text bodies; every other route
//! answers with a JSON `{"error": ..}` body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use compact_str::CompactString;
use pcore::ErrorKind;
use protocol::{ChatPage, ErrorBody};

/// Errors returned by the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Chat requests from share pages are refused.
    #[error("Chat API is not available on share pages")]
    SharePage,
    /// The selected provider is unknown, disabled, or the model is disabled.
    #[error("Selected provider is not enabled {0}")]
    ProviderDisabled(CompactString),
    /// The chat request could not be processed.
    #[error("Error processing your request")]
    ChatRequest(#[source] anyhow::Error),
    /// A bearer token was sent but is not known.
    #[error("Invalid API key")]
    Unauthorized,
    /// No stored chat with this id for the user.
    #[error("Chat not found")]
    ChatNotFound,
    /// Listing chats failed.
    #[error("failed to fetch chats")]
    ListChats(#[source] anyhow::Error),
    /// Loading a chat failed.
    #[error("Failed to load chat")]
    LoadChat(#[source] anyhow::Error),
    /// Deleting a chat failed.
    #[error("Failed to delete chat")]
    DeleteChat(#[source] anyhow::Error),
    /// Super prompt input was missing or empty.
    #[error("Input is required")]
    InputRequired,
    /// The super prompt provider did not answer in time.
    #[error("super prompt generation timed out")]
    Timeout,
    /// The provider answered with nothing.
    #[error("No prompt was generated")]
    NoPrompt,
    /// Any other super prompt failure.
    #[error("Failed to generate super prompt")]
    SuperPrompt(#[source] anyhow::Error),
}

impl ApiError {
    /// The status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::SharePage => StatusCode::FORBIDDEN,
            Self::ProviderDisabled(_) | Self::ChatNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InputRequired => StatusCode::BAD_REQUEST,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::ChatRequest(_)
            | Self::ListChats(_)
            | Self::LoadChat(_)
            | Self::DeleteChat(_)
            | Self::NoPrompt
            | Self::SuperPrompt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::ChatRequest(e)
            | Self::ListChats(e)
            | Self::LoadChat(e)
            | Self::DeleteChat(e)
            | Self::SuperPrompt(e) => tracing::error!("{self}: {e:#}"),
            _ => tracing::warn!("{status}: {self}"),
        }

        match self {
            Self::SharePage | Self::ProviderDisabled(_) | Self::ChatRequest(_) => {
                (status, self.to_string()).into_response()
            }
            Self::ListChats(_) => (status, Json(ChatPage::default())).into_response(),
            Self::Timeout => (
                status,
                Json(ErrorBody::new(ErrorKind::Timeout.user_message())),
            )
                .into_response(),
            other => (status, Json(ErrorBody::new(other.to_string()))).into_response(),
        }
    }
}
