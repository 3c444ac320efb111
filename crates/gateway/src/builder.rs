//! Gateway builder: constructs a fully-configured gateway from config.

use crate::{
    GatewayConfig,
    api_key::ApiKeyAuthenticator,
    backend::StoreBackend,
    config::{SearchBackendKind, StorageBackendKind},
    hook::GatewayHook,
    provider::ProviderRegistry,
    state::Gateway,
    super_prompt::SuperPrompt,
    tools::{SearchService, TavilySearch, ToolSet},
};
use anyhow::Result;
use llm::Client;
use std::{path::Path, sync::Arc};

/// Build a `Gateway<GatewayHook, ApiKeyAuthenticator>` from config.
///
/// The SQLite store lives at `config_dir/data/chats.db` unless the config
/// names a path.
pub fn build_gateway(
    config: &GatewayConfig,
    config_dir: &Path,
) -> Result<Gateway<GatewayHook, ApiKeyAuthenticator>> {
    let store = match config.storage.backend {
        StorageBackendKind::InMemory => {
            tracing::info!("using in-memory chat store");
            StoreBackend::in_memory()
        }
        StorageBackendKind::Sqlite => {
            let path = config.chats_db(config_dir);
            tracing::info!("using sqlite chat store at {}", path.display());
            StoreBackend::sqlite(&path)?
        }
    };

    let client = Client::new();
    let providers = ProviderRegistry::from_configs(&config.providers, client.clone())?;
    let enabled = providers.enabled().collect::<Vec<_>>();
    if enabled.is_empty() {
        tracing::warn!("no provider is enabled, every chat request will be rejected");
    } else {
        tracing::info!("enabled providers: {}", enabled.join(", "));
    }

    let search = match config.search.backend {
        SearchBackendKind::Tavily if !config.search.api_key.is_empty() => {
            tracing::info!("search tools backed by tavily");
            SearchService::Tavily(TavilySearch::new(
                client,
                config.search.api_key.clone(),
                config.search.base_url.as_deref(),
            ))
        }
        SearchBackendKind::Tavily => {
            tracing::warn!("tavily api key missing, search tools disabled");
            SearchService::Disabled
        }
        SearchBackendKind::None => SearchService::Disabled,
    };
    let tools = ToolSet::new(search, config.search.max_results);

    let super_provider = providers.get(&config.super_prompt.provider).cloned();
    if super_provider.is_none() {
        tracing::warn!(
            "super prompt provider '{}' is not enabled",
            config.super_prompt.provider
        );
    }
    let super_prompt = SuperPrompt::new(super_provider, config.super_prompt.clone());

    Ok(Gateway {
        providers: Arc::new(providers),
        store: Arc::new(store),
        tools: Arc::new(tools),
        super_prompt: Arc::new(super_prompt),
        chat: Arc::new(config.chat.clone()),
        authenticator: Arc::new(ApiKeyAuthenticator::from_config(&config.auth)),
    })
}
