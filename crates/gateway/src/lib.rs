//! Parley gateway: HTTP API that streams LLM chats.
//!
//! Composes the provider registry, the stream orchestrator with its tools,
//! chat storage, super prompt generation, and API key authentication into
//! an axum server.

pub mod api_key;
pub mod auth;
pub mod backend;
pub mod builder;
pub mod config;
pub mod error;
pub mod hook;
pub mod orchestrator;
pub mod provider;
pub mod routes;
pub mod serve;
pub mod state;
pub mod super_prompt;
pub mod tools;
pub mod utils;

pub use api_key::ApiKeyAuthenticator;
pub use auth::{AuthContext, AuthError, Authenticator};
pub use backend::StoreBackend;
pub use builder::build_gateway;
pub use config::GatewayConfig;
pub use error::ApiError;
pub use hook::{GatewayHook, Hook};
pub use orchestrator::{ChatTurn, Orchestrator, Phase};
pub use provider::ProviderRegistry;
pub use serve::{ServeHandle, serve, serve_gateway, serve_with_config};
pub use state::Gateway;
pub use super_prompt::SuperPrompt;
pub use tools::{SearchBackend, SearchService, ToolSet};
