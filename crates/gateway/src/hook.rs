//! Gateway hook: type-level wiring of provider, store, and search backend.

use crate::{
    backend::StoreBackend,
    tools::{SearchBackend, SearchService},
};
use llm::{LLM, OpenAI};
use pcore::Store;

/// Type-level configuration for a gateway.
///
/// Handlers and the orchestrator are generic over a `Hook`, so tests can
/// swap in scripted providers and fake backends without dynamic dispatch.
pub trait Hook: Send + Sync + 'static {
    /// Completion provider.
    type Provider: LLM;
    /// Chat store.
    type Store: Store;
    /// Search backend for the gateway-side tools.
    type Search: SearchBackend;
}

/// Production wiring: OpenAI-compatible providers, configured store and
/// search backend.
pub struct GatewayHook;

impl Hook for GatewayHook {
    type Provider = OpenAI;
    type Store = StoreBackend;
    type Search = SearchService;
}
