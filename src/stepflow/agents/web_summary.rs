// SPDX-License-Identifier: MIT

//! Search, scrape and summarize a user question
//!
//! ```text
//! optimize_query -> search -> summarize -> END
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::prompts::{query_optimizer_prompt, WEB_SUMMARY_INSTRUCTIONS};
use crate::adk::error::StepflowError;
use crate::adk::model::{generate_text, GenerationConfig, Message, Model};
use crate::adk::tool::Tool;
use crate::stepflow::graph::{
    CompiledGraph, ErrorPolicy, GraphBuilder, Step, StepResult, END,
};
use crate::stepflow::registry::ToolRegistry;
use crate::stepflow::state::{StateRecord, StateUpdate, WorkflowState};
use crate::stepflow::tools::{SearchResult, WebSearchResult};

pub const OPTIMIZE_QUERY: &str = "optimize_query";
pub const SEARCH: &str = "search";
pub const SUMMARIZE: &str = "summarize";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebSummaryState {
    pub user_query: String,
    pub user_query_optimized: String,
    pub search_response: Vec<SearchResult>,
    pub summary_response: String,
    /// Report from the file writer
    pub saved_to: Option<String>,
}

impl StateRecord for WebSummaryState {}

impl WebSummaryState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            user_query: query.into(),
            ..Self::default()
        }
    }
}

pub struct OptimizeQueryStep {
    model: Arc<dyn Model>,
}

#[async_trait]
impl Step for OptimizeQueryStep {
    async fn execute(&self, state: &WorkflowState) -> Result<StepResult, StepflowError> {
        let query: String = state.get_as("user_query")?;
        let messages = [Message::user(query_optimizer_prompt(&query))];
        let optimized = generate_text(
            self.model.as_ref(),
            &messages,
            &GenerationConfig::with_temperature(0.0),
        )
        .await?;
        log::info!("Optimized query: {}", optimized.trim());

        Ok(StepResult::goto(
            SEARCH,
            StateUpdate::new().set("user_query_optimized", optimized.trim()),
        ))
    }

    fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy::Propagate
    }
}

pub struct SearchStep {
    tool: Arc<dyn Tool>,
}

#[async_trait]
impl Step for SearchStep {
    async fn execute(&self, state: &WorkflowState) -> Result<StepResult, StepflowError> {
        let query: String = state.get_as("user_query_optimized")?;
        let output = self
            .tool
            .execute(json!({"query": query, "count": 3}))
            .await?;
        let found: WebSearchResult = serde_json::from_value(output)?;

        let update =
            StateUpdate::new().set("search_response", serde_json::to_value(found.results)?);
        Ok(StepResult::goto(SUMMARIZE, update))
    }

    fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy::Propagate
    }
}

/// Scrapes every search hit, summarizes the pages and saves the summary
pub struct SummarizeStep {
    model: Arc<dyn Model>,
    scraper: Arc<dyn Tool>,
    writer: Arc<dyn Tool>,
}

#[async_trait]
impl Step for SummarizeStep {
    async fn execute(&self, state: &WorkflowState) -> Result<StepResult, StepflowError> {
        let state: WebSummaryState = state.decode()?;

        let mut pages = Vec::with_capacity(state.search_response.len());
        for result in &state.search_response {
            let text = self.scraper.execute(json!({"url": result.url})).await?;
            pages.push(format!(
                "URL: {}\nContent: {}",
                result.url,
                text.as_str().unwrap_or_default()
            ));
        }

        let messages = [
            Message::system(WEB_SUMMARY_INSTRUCTIONS),
            Message::user(pages.join("\n\n")),
        ];
        let summary = generate_text(
            self.model.as_ref(),
            &messages,
            &GenerationConfig::with_temperature(0.1),
        )
        .await?;

        let report = self.writer.execute(json!({"text": summary})).await?;
        let update = StateUpdate::new()
            .set("summary_response", summary)
            .set("saved_to", report);
        Ok(StepResult::end(update))
    }

    fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy::Propagate
    }
}

/// Build the web summary graph; requires `web_search`, `web_scrape` and
/// `write_file` tools
pub async fn build_graph(
    planner: Arc<dyn Model>,
    summarizer: Arc<dyn Model>,
    tools: &ToolRegistry,
) -> Result<CompiledGraph, StepflowError> {
    let search = tools.require("web_search").await?;
    let scraper = tools.require("web_scrape").await?;
    let writer = tools.require("write_file").await?;

    let mut builder = GraphBuilder::new("web_summary");
    builder
        .add_step(OPTIMIZE_QUERY, OptimizeQueryStep { model: planner })
        .add_step(SEARCH, SearchStep { tool: search })
        .add_step(
            SUMMARIZE,
            SummarizeStep {
                model: summarizer,
                scraper,
                writer,
            },
        )
        .add_command_edges(OPTIMIZE_QUERY, [SEARCH])
        .add_command_edges(SEARCH, [SUMMARIZE])
        .add_command_edges(SUMMARIZE, [END])
        .set_entry_point(OPTIMIZE_QUERY);
    Ok(builder.compile()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_requires_every_tool() {
        struct Silent;

        #[async_trait]
        impl Model for Silent {
            fn name(&self) -> &str {
                "silent"
            }

            async fn generate(
                &self,
                _messages: &[Message],
                _config: &GenerationConfig,
            ) -> Result<Message, crate::adk::error::ModelError> {
                Ok(Message::assistant(""))
            }
        }

        let model: Arc<dyn Model> = Arc::new(Silent);
        let err = build_graph(model.clone(), model, &ToolRegistry::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StepflowError::ToolNotFound { name } if name == "web_search"));
    }

    #[test]
    fn test_initial_state() {
        let state = WorkflowState::from_record(&WebSummaryState::new("What is k8s?")).unwrap();
        assert_eq!(state.get_as::<String>("user_query").unwrap(), "What is k8s?");
        assert!(state.get("saved_to").unwrap().is_null());
    }
}
