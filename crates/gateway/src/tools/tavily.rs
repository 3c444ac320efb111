//! Tavily search and extract client.

use super::{SearchArgs, SearchBackend, SearchDepth, SearchResult, SearchResults};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::future::Future;

/// Default Tavily API base URL.
pub const TAVILY_BASE: &str = "https://api.tavily.com";

/// Tavily returns thin results below this count.
const MIN_RESULTS: u32 = 5;

/// Retrieved page content is cut at this many characters.
const MAX_CONTENT_CHARS: usize = 10_000;

/// Tavily-backed search.
#[derive(Clone)]
pub struct TavilySearch {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
    #[serde(default)]
    images: Vec<Value>,
}

#[derive(Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    results: Vec<Extracted>,
}

#[derive(Deserialize)]
struct Extracted {
    url: String,
    #[serde(default)]
    raw_content: String,
}

impl TavilySearch {
    /// Create a client for the given API key.
    pub fn new(client: Client, api_key: impl Into<String>, base_url: Option<&str>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.unwrap_or(TAVILY_BASE).trim_end_matches('/').to_owned(),
        }
    }

    async fn post<T: for<'de> Deserialize<'de>>(&self, path: &str, body: Value) -> Result<T> {
        let url = format!("{}/{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("failed to fetch {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("tavily returned {status}: {text}");
        }
        Ok(response.json().await?)
    }
}

impl SearchBackend for TavilySearch {
    fn search(&self, args: &SearchArgs) -> impl Future<Output = Result<SearchResults>> + Send {
        let body = json!({
            "query": args.query,
            "max_results": args.max_results.unwrap_or(MIN_RESULTS).max(MIN_RESULTS),
            "search_depth": args.search_depth.unwrap_or(SearchDepth::Basic),
            "include_images": true,
            "include_answer": true,
            "include_domains": args.include_domains,
            "exclude_domains": args.exclude_domains,
        });
        let query = args.query.clone();
        async move {
            tracing::debug!("tavily search: {query}");
            let response: SearchResponse = self.post("search", body).await?;
            let images = response
                .images
                .into_iter()
                .filter_map(|image| match image {
                    Value::String(url) => Some(url),
                    Value::Object(mut map) => match map.remove("url") {
                        Some(Value::String(url)) => Some(url),
                        _ => None,
                    },
                    _ => None,
                })
                .collect();
            Ok(SearchResults {
                query,
                results: response.results,
                images,
            })
        }
    }

    fn retrieve(&self, url: &str) -> impl Future<Output = Result<SearchResults>> + Send {
        let body = json!({ "urls": [url], "extract_depth": "basic" });
        let query = url.to_owned();
        async move {
            tracing::debug!("tavily extract: {query}");
            let response: ExtractResponse = self.post("extract", body).await?;
            let results = response
                .results
                .into_iter()
                .map(|page| SearchResult {
                    title: page
                        .raw_content
                        .lines()
                        .find(|line| !line.trim().is_empty())
                        .map(|line| line.trim_start_matches('#').trim().to_owned())
                        .unwrap_or_default(),
                    content: page.raw_content.chars().take(MAX_CONTENT_CHARS).collect(),
                    url: page.url,
                })
                .collect();
            Ok(SearchResults {
                query,
                results,
                images: Vec::new(),
            })
        }
    }
}
