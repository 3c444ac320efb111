//! Client error type.

use pcore::ErrorKind;

/// Errors from session operations and gateway calls.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A generation is already in flight.
    #[error("a response is already being generated")]
    Busy,
    /// No message has the given id.
    #[error("no message with id {0}")]
    UnknownMessage(String),
    /// Only user messages can be edited.
    #[error("message {0} is not a user message")]
    NotUserMessage(String),
    /// No user message to regenerate from.
    #[error("nothing to reload")]
    NothingToReload,
    /// The last assistant message has no such pending tool call.
    #[error("no pending tool call with id {0}")]
    UnknownToolCall(String),
    /// The gateway answered with an error status.
    #[error("gateway returned {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },
    /// The data stream reported an error.
    #[error("{0}")]
    Server(String),
    /// The gateway could not be reached or the stream broke off.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl SessionError {
    /// The notification text for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } if !message.is_empty() => message.clone(),
            Self::Rejected { status, .. } => ErrorKind::classify(&status.to_string())
                .user_message()
                .to_owned(),
            Self::Server(message) => message.clone(),
            Self::Transport(err) => ErrorKind::of(err).user_message().to_owned(),
            other => other.to_string(),
        }
    }
}
