//! Gateway configuration loaded from TOML.

use anyhow::{Context, Result};
use compact_str::CompactString;
use protocol::ModelSpec;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Config directory name under platform config dir.
pub const CONFIG_DIR: &str = "parley";
/// Config file name inside the config directory.
pub const CONFIG_FILE: &str = "gateway.toml";
/// Data subdirectory.
pub const DATA_DIR: &str = "data";
/// SQLite chat database filename.
pub const CHATS_DB: &str = "chats.db";

/// Resolve the global configuration directory (`~/.config/parley/` on unix).
pub fn global_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR))
}

/// Top-level gateway configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Chat orchestration settings.
    #[serde(default)]
    pub chat: ChatConfig,
    /// Enabled LLM providers.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    /// Search tool backend.
    #[serde(default)]
    pub search: SearchConfig,
    /// Super prompt generation.
    #[serde(default)]
    pub super_prompt: SuperPromptConfig,
    /// Chat storage backend.
    #[serde(default)]
    pub storage: StorageConfig,
    /// API key to user id mapping.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind, `host:port`.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_owned(),
        }
    }
}

/// Chat orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Persist completed turns.
    pub save_history: bool,
    /// Maximum generation steps in a native tool-calling run.
    pub max_steps: usize,
    /// Generate related-question suggestions after a run.
    pub related_questions: bool,
    /// Model used when the client sends none.
    pub default_model: ModelSpec,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            save_history: true,
            max_steps: 5,
            related_questions: true,
            default_model: ModelSpec::default(),
        }
    }
}

/// One LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider id, matched against the selected model's `providerId`.
    pub id: CompactString,
    /// Wire endpoint family.
    #[serde(default)]
    pub kind: ProviderKind,
    /// API key (supports `${ENV_VAR}` expansion).
    #[serde(default)]
    pub api_key: String,
    /// Optional endpoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Whether the provider may be used.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Supported provider endpoints, all OpenAI-compatible.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI API (default).
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    /// DeepSeek API.
    #[serde(rename = "deepseek")]
    DeepSeek,
    /// xAI (Grok) API.
    Xai,
    /// Groq API.
    Groq,
    /// Fireworks API.
    Fireworks,
    /// Ollama local API, no key required.
    Ollama,
    /// Any OpenAI-compatible endpoint given by `base_url`.
    Custom,
}

/// Search backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Backend kind.
    pub backend: SearchBackendKind,
    /// API key (supports `${ENV_VAR}` expansion).
    pub api_key: String,
    /// Optional endpoint base override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Default result count when the model asks for none.
    pub max_results: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: SearchBackendKind::Tavily,
            api_key: "${TAVILY_API_KEY}".to_owned(),
            base_url: None,
            max_results: 5,
        }
    }
}

/// Search backend kind.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchBackendKind {
    /// Tavily search and extract API.
    #[default]
    Tavily,
    /// No backend; search tools report an error.
    None,
}

/// Super prompt generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuperPromptConfig {
    /// Provider id from `[[providers]]`.
    pub provider: CompactString,
    /// Model id.
    pub model: CompactString,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: usize,
    /// Provider call timeout.
    pub timeout_secs: u64,
}

impl Default for SuperPromptConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            model: "gpt-3.5-turbo".into(),
            temperature: 0.7,
            max_tokens: 1000,
            timeout_secs: 60,
        }
    }
}

/// Chat storage configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend type: "in_memory" or "sqlite".
    pub backend: StorageBackendKind,
    /// SQLite database path. Defaults to `<config_dir>/data/chats.db`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Storage backend kind.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackendKind {
    /// In-memory backend (no persistence).
    #[default]
    InMemory,
    /// SQLite-backed persistent store.
    Sqlite,
}

/// Authentication configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// API key to user id.
    pub api_keys: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl GatewayConfig {
    /// Parse a TOML string into a `GatewayConfig`, expanding environment
    /// variables first.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let expanded = crate::utils::expand_env_vars(toml_str);
        let config: Self = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// A config with the single default OpenAI provider.
    pub fn with_default_provider() -> Self {
        Self {
            providers: vec![ProviderConfig {
                id: "openai".into(),
                kind: ProviderKind::OpenAI,
                api_key: "${OPENAI_API_KEY}".to_owned(),
                base_url: None,
                enabled: true,
            }],
            ..Default::default()
        }
    }

    /// Resolve the SQLite database path.
    pub fn chats_db(&self, config_dir: &Path) -> PathBuf {
        self.storage
            .path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| config_dir.join(DATA_DIR).join(CHATS_DB))
    }
}

/// Scaffold the config directory on first run.
///
/// Creates the data subdirectory and writes a default gateway.toml.
pub fn scaffold_config_dir(config_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(config_dir.join(DATA_DIR))
        .context("failed to create data directory")?;

    let gateway_toml = config_dir.join(CONFIG_FILE);
    let contents = toml::to_string_pretty(&GatewayConfig::with_default_provider())
        .context("failed to serialize default config")?;
    std::fs::write(&gateway_toml, contents)
        .with_context(|| format!("failed to write {}", gateway_toml.display()))?;

    Ok(())
}
