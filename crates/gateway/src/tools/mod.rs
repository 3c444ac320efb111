//! Tools offered to the model: `search`, `retrieve`, and `ask_question`.
//!
//! `search` and `retrieve` run on the gateway through a [`SearchBackend`].
//! `ask_question` is answered by the client, so a run that calls it ends
//! without executing it.

pub use tavily::TavilySearch;

use anyhow::{Result, anyhow, bail};
use llm::Tool;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

mod tavily;

/// Name of the web search tool.
pub const SEARCH: &str = "search";
/// Name of the page retrieval tool.
pub const RETRIEVE: &str = "retrieve";
/// Name of the clarifying question tool.
pub const ASK_QUESTION: &str = "ask_question";

/// Arguments of the `search` tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchArgs {
    /// The query to search for.
    pub query: String,
    /// The maximum number of results to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    /// The depth of the search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_depth: Option<SearchDepth>,
    /// Only return results from these domains.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_domains: Vec<String>,
    /// Never return results from these domains.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_domains: Vec<String>,
}

/// Search depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    /// Fast, shallow search.
    #[default]
    Basic,
    /// Slower, more thorough search.
    Advanced,
}

/// Arguments of the `retrieve` tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RetrieveArgs {
    /// The URL to retrieve.
    pub url: String,
}

/// Arguments of the `ask_question` tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AskQuestionArgs {
    /// The question to ask the user.
    pub question: String,
    /// Predefined answers the user can pick from.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,
    /// Whether the user may type a free-form answer.
    #[serde(default)]
    pub allows_input: bool,
    /// Label for the free-form input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_label: Option<String>,
    /// Placeholder for the free-form input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_placeholder: Option<String>,
}

/// One predefined answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionOption {
    /// Value sent back.
    pub value: String,
    /// Label shown.
    pub label: String,
}

/// Search or retrieval results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// The query, or the URL for retrievals.
    pub query: String,
    /// Matching documents.
    pub results: Vec<SearchResult>,
    /// Related image URLs.
    #[serde(default)]
    pub images: Vec<String>,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title.
    pub title: String,
    /// Page URL.
    pub url: String,
    /// Relevant page content.
    pub content: String,
}

/// A web search and page retrieval service.
pub trait SearchBackend: Send + Sync + 'static {
    /// Search the web.
    fn search(&self, args: &SearchArgs) -> impl Future<Output = Result<SearchResults>> + Send;

    /// Fetch the content of a page.
    fn retrieve(&self, url: &str) -> impl Future<Output = Result<SearchResults>> + Send;
}

/// Search backend selected from gateway configuration.
pub enum SearchService {
    /// Tavily search and extract.
    Tavily(TavilySearch),
    /// No backend configured.
    Disabled,
}

impl SearchBackend for SearchService {
    fn search(&self, args: &SearchArgs) -> impl Future<Output = Result<SearchResults>> + Send {
        let args = args.clone();
        async move {
            match self {
                Self::Tavily(tavily) => tavily.search(&args).await,
                Self::Disabled => bail!("search backend is not configured"),
            }
        }
    }

    fn retrieve(&self, url: &str) -> impl Future<Output = Result<SearchResults>> + Send {
        let url = url.to_owned();
        async move {
            match self {
                Self::Tavily(tavily) => tavily.retrieve(&url).await,
                Self::Disabled => bail!("search backend is not configured"),
            }
        }
    }
}

/// The tool definitions plus the backend that runs them.
pub struct ToolSet<S> {
    backend: S,
    max_results: u32,
}

impl<S: SearchBackend> ToolSet<S> {
    /// Create a tool set over `backend`.
    pub fn new(backend: S, max_results: u32) -> Self {
        Self {
            backend,
            max_results,
        }
    }

    /// Definitions of every tool, for native tool calling.
    pub fn definitions(&self) -> Vec<Tool> {
        vec![
            Tool::of::<SearchArgs>(SEARCH, "Search the web for information"),
            Tool::of::<RetrieveArgs>(RETRIEVE, "Retrieve content from the web"),
            Tool::of::<AskQuestionArgs>(
                ASK_QUESTION,
                "Ask a clarifying question with multiple options when the user's query is \
                 ambiguous or lacks specific details",
            ),
        ]
    }

    /// Run a gateway-side tool with its JSON arguments.
    pub async fn execute(&self, name: &str, arguments: &str) -> Result<Value> {
        let arguments = if arguments.trim().is_empty() {
            "{}"
        } else {
            arguments
        };
        let results = match name {
            SEARCH => {
                let mut args: SearchArgs = serde_json::from_str(arguments)?;
                args.max_results.get_or_insert(self.max_results);
                self.backend.search(&args).await?
            }
            RETRIEVE => {
                let args: RetrieveArgs = serde_json::from_str(arguments)?;
                self.backend.retrieve(&args.url).await?
            }
            ASK_QUESTION => return Err(anyhow!("{ASK_QUESTION} is answered by the client")),
            other => bail!("function {other} not available"),
        };
        Ok(serde_json::to_value(results)?)
    }

    /// The search backend.
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Default result count for searches.
    pub fn max_results(&self) -> u32 {
        self.max_results
    }
}
