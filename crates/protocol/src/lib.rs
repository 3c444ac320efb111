//! Parley wire protocol types shared between gateway and client.
//!
//! UI messages and chat metadata travel as camelCase JSON. Streamed chat
//! responses use the line-oriented data stream in [`stream`].

pub use annotation::{ReasoningData, RelatedQuestion, RelatedQuestions, StreamAnnotation};
pub use api::{
    Chat, ChatPage, ChatRequest, DeleteResponse, ErrorBody, SuperPromptRequest,
    SuperPromptResponse,
};
pub use message::{InvocationState, Part, ToolInvocation, UiMessage, UiRole};
pub use model::{ModelSpec, ToolCallType};
pub use stream::{DataStreamPart, FinishPart, LineDecoder, ProtocolError, TokenUsage};

mod annotation;
mod api;
mod message;
mod model;
pub mod stream;

/// Response header carrying the (possibly freshly generated) chat id.
pub const CHAT_ID_HEADER: &str = "X-Chat-ID";

/// Response header marking a data-stream body.
pub const DATA_STREAM_HEADER: &str = "x-vercel-ai-data-stream";

/// Cookie holding the JSON-encoded [`ModelSpec`].
pub const MODEL_COOKIE: &str = "selectedModel";

/// Cookie holding the search-mode flag (`"true"` enables it).
pub const SEARCH_MODE_COOKIE: &str = "search-mode";

/// Chat id a client sends before the server has assigned one.
pub const NEW_CHAT_ID: &str = "new";
