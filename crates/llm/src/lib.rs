//! Completion provider interface for Parley.
//!
//! This crate provides the provider-facing types shared by the gateway:
//! `Message`, `Response`, `StreamChunk`, `Tool`, `General`, and the `LLM`
//! trait. It also ships `HttpProvider` for OpenAI-compatible SSE transport,
//! the `OpenAI` provider built on it, context-window limits, and the
//! history truncation policy.

pub use config::General;
pub use http::{HttpProvider, StatusError};
pub use limits::{default_context_limit, is_reasoning_model, max_allowed_tokens};
pub use message::{Message, MessageBuilder, Role, estimate_tokens};
pub use openai::{OpenAI, endpoint};
pub use provider::LLM;
pub use request::{FunctionTool, Request, StreamOptions};
pub use reqwest::{self, Client};
pub use response::{Choice, CompletionMeta, Delta, FinishReason, Response, Usage};
pub use stream::StreamChunk;
#[cfg(feature = "testing")]
pub use testing::{Script, ScriptedProvider};
pub use tool::{FunctionCall, Tool, ToolCall, ToolChoice};
pub use truncate::{TruncateError, truncate};

mod config;
mod http;
mod limits;
mod message;
mod openai;
mod provider;
mod request;
mod response;
mod stream;
#[cfg(feature = "testing")]
mod testing;
mod tool;
mod truncate;
