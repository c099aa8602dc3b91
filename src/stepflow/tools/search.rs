// SPDX-License-Identifier: MIT

use crate::adk::error::StepflowError;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

pub const BRAVE_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";

// --- Static schema ---

static WEB_SEARCH_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "The search query"
            },
            "count": {
                "type": "integer",
                "description": "Number of results to return (default 3, max 20)"
            },
            "freshness": {
                "type": "string",
                "description": "Freshness filter: pd (past day), pw (past week), pm (past month), py (past year)"
            }
        },
        "required": ["query"]
    })
});

#[derive(Debug, Serialize, Deserialize)]
pub struct WebSearchArgs {
    pub query: String,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub freshness: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebSearchResult {
    pub results: Vec<SearchResult>,
    pub query: String,
}

/// Web search backed by the Brave Search API
pub struct BraveSearchTool {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl BraveSearchTool {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, StepflowError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key: api_key.into(),
            endpoint: BRAVE_SEARCH_URL.to_string(),
        })
    }

    /// Point the tool at a different search endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Tool for BraveSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Searches the web using Brave Search API. Returns relevant search results with titles, URLs, and descriptions."
    }

    fn schema(&self) -> &Value {
        &WEB_SEARCH_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<Value, StepflowError> {
        let args: WebSearchArgs = serde_json::from_value(input)?;

        let count = args.count.unwrap_or(3).min(20).to_string();
        let mut query = vec![("q", args.query.as_str()), ("count", count.as_str())];
        if let Some(freshness) = &args.freshness {
            query.push(("freshness", freshness.as_str()));
        }

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(StepflowError::api("brave", text));
        }

        let body: Value = resp.json().await?;

        let results_json = body
            .get("web")
            .and_then(|w| w.get("results"))
            .ok_or_else(|| StepflowError::api("brave", "Invalid response format: missing web.results"))?;

        let results: Vec<SearchResult> = serde_json::from_value(results_json.clone())?;
        log::debug!("Brave returned {} results for '{}'", results.len(), args.query);

        let result = WebSearchResult {
            results,
            query: args.query,
        };

        Ok(serde_json::to_value(result)?)
    }
}
