//! Named provider registry.
//!
//! Providers are keyed by the `providerId` clients put in their selected
//! model. A provider is usable only when it is enabled and, except for
//! Ollama, has an API key after environment expansion.

use crate::config::{ProviderConfig, ProviderKind};
use anyhow::{Result, bail};
use compact_str::CompactString;
use llm::{Client, LLM, OpenAI, endpoint};
use std::collections::BTreeMap;

/// Build an OpenAI-compatible provider from its config.
pub fn build_provider(config: &ProviderConfig, client: Client) -> Result<OpenAI> {
    let url = config.base_url.as_deref();
    let provider = match config.kind {
        ProviderKind::Ollama => OpenAI::ollama(client, url),
        ProviderKind::Custom => {
            let Some(url) = url else {
                bail!("provider '{}' of kind custom needs a base_url", config.id);
            };
            OpenAI::custom(client, &config.api_key, url)?
        }
        kind => {
            let default = match kind {
                ProviderKind::DeepSeek => endpoint::DEEPSEEK,
                ProviderKind::Xai => endpoint::XAI,
                ProviderKind::Groq => endpoint::GROQ,
                ProviderKind::Fireworks => endpoint::FIREWORKS,
                _ => endpoint::OPENAI,
            };
            OpenAI::custom(client, &config.api_key, url.unwrap_or(default))?
        }
    };
    Ok(provider)
}

/// Providers keyed by provider id.
pub struct ProviderRegistry<P: LLM> {
    providers: BTreeMap<CompactString, Entry<P>>,
}

struct Entry<P> {
    provider: P,
    enabled: bool,
}

impl<P: LLM> Default for ProviderRegistry<P> {
    fn default() -> Self {
        Self {
            providers: BTreeMap::new(),
        }
    }
}

impl<P: LLM> ProviderRegistry<P> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. Replaces any provider with the same id.
    pub fn insert(&mut self, id: impl Into<CompactString>, provider: P, enabled: bool) {
        self.providers
            .insert(id.into(), Entry { provider, enabled });
    }

    /// Builder-style [`insert`](Self::insert) of an enabled provider.
    pub fn with(mut self, id: impl Into<CompactString>, provider: P) -> Self {
        self.insert(id, provider, true);
        self
    }

    /// The provider, if it exists and is enabled.
    pub fn get(&self, id: &str) -> Option<&P> {
        self.providers
            .get(id)
            .filter(|entry| entry.enabled)
            .map(|entry| &entry.provider)
    }

    /// Ids of all enabled providers.
    pub fn enabled(&self) -> impl Iterator<Item = &str> {
        self.providers
            .iter()
            .filter(|(_, entry)| entry.enabled)
            .map(|(id, _)| id.as_str())
    }
}

impl ProviderRegistry<OpenAI> {
    /// Build every configured provider, sharing one HTTP client.
    pub fn from_configs(configs: &[ProviderConfig], client: Client) -> Result<Self> {
        let mut registry = Self::new();
        for config in configs {
            let has_key = config.kind == ProviderKind::Ollama || !config.api_key.is_empty();
            if config.enabled && !has_key {
                tracing::warn!("provider '{}' has no api key, disabling it", config.id);
            }
            let provider = build_provider(config, client.clone())?;
            registry.insert(config.id.clone(), provider, config.enabled && has_key);
            tracing::info!("registered provider '{}' ({:?})", config.id, config.kind);
        }
        Ok(registry)
    }
}
