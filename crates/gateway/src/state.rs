//! Shared state available to all request handlers.

use crate::{
    auth::Authenticator,
    config::ChatConfig,
    hook::Hook,
    orchestrator::Orchestrator,
    provider::ProviderRegistry,
    super_prompt::SuperPrompt,
    tools::ToolSet,
};
use std::sync::Arc;

/// The gateway: providers, store, tools, and authenticator.
pub struct Gateway<H: Hook, A: Authenticator> {
    /// Providers keyed by provider id.
    pub providers: Arc<ProviderRegistry<H::Provider>>,
    /// Chat store.
    pub store: Arc<H::Store>,
    /// Tools offered to models.
    pub tools: Arc<ToolSet<H::Search>>,
    /// Super prompt generator.
    pub super_prompt: Arc<SuperPrompt<H::Provider>>,
    /// Chat orchestration settings.
    pub chat: Arc<ChatConfig>,
    /// Authenticator.
    pub authenticator: Arc<A>,
}

impl<H: Hook, A: Authenticator> Clone for Gateway<H, A> {
    fn clone(&self) -> Self {
        Self {
            providers: Arc::clone(&self.providers),
            store: Arc::clone(&self.store),
            tools: Arc::clone(&self.tools),
            super_prompt: Arc::clone(&self.super_prompt),
            chat: Arc::clone(&self.chat),
            authenticator: Arc::clone(&self.authenticator),
        }
    }
}

impl<H: Hook, A: Authenticator> Gateway<H, A> {
    /// An orchestrator driving `provider`.
    pub fn orchestrator(&self, provider: H::Provider) -> Orchestrator<H> {
        Orchestrator::new(
            provider,
            Arc::clone(&self.store),
            Arc::clone(&self.tools),
            ChatConfig::clone(&self.chat),
        )
    }
}
