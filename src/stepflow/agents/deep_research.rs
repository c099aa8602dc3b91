// SPDX-License-Identifier: MIT

//! Iterative web research workflow
//!
//! ```text
//! generate_query -> web_search -> summarize -> reflect -+-> finalize_summary -> END
//!                       ^                               |
//!                       +-------------------------------+
//! ```
//!
//! The loop bound is checked before the model's `keep_searching` flag, and a
//! cleared flag still falls back to another search, so the run always ends
//! once `web_search_loop_count` exceeds `max_web_search_loop_count`.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::prompts::{
    render, QUERY_WRITER_INSTRUCTIONS, REFLECTION_INSTRUCTIONS, SUMMARIZE_INSTRUCTIONS,
};
use crate::adk::error::StepflowError;
use crate::adk::model::{generate_structured, generate_text, GenerationConfig, Message, Model};
use crate::adk::tool::Tool;
use crate::stepflow::graph::{
    CompiledGraph, ConditionRouter, ErrorPolicy, GraphBuilder, Step, StepResult, END,
};
use crate::stepflow::registry::ToolRegistry;
use crate::stepflow::state::{ReducerType, StateRecord, StateUpdate, WorkflowState};
use crate::stepflow::tools::WebSearchResult;

pub const GENERATE_QUERY: &str = "generate_query";
pub const WEB_SEARCH: &str = "web_search";
pub const SUMMARIZE: &str = "summarize";
pub const REFLECT: &str = "reflect";
pub const FINALIZE_SUMMARY: &str = "finalize_summary";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeepResearchState {
    pub research_topic: String,
    pub research_query: String,
    pub web_search_loop_count: u32,
    pub max_web_search_loop_count: u32,
    pub web_search_responses: Vec<WebSearchResult>,
    pub keep_searching: bool,
    pub summary: String,
    pub error: Option<String>,
}

impl StateRecord for DeepResearchState {
    fn reducers() -> Vec<(&'static str, ReducerType)> {
        vec![("web_search_responses", ReducerType::Append)]
    }
}

impl DeepResearchState {
    pub fn new(topic: impl Into<String>, max_loops: u32) -> Self {
        Self {
            research_topic: topic.into(),
            max_web_search_loop_count: max_loops,
            keep_searching: true,
            ..Self::default()
        }
    }
}

/// First search query for the topic
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchQuery {
    /// The web search query
    pub query: String,
}

/// Outcome of reflecting on the current summary
#[derive(Debug, Deserialize, JsonSchema)]
pub struct Reflection {
    /// What the summary does not cover yet
    #[serde(default)]
    pub knowledge_gap: String,
    /// Self-contained query that fills the gap
    pub follow_up_query: String,
    /// Whether another search is worthwhile
    #[serde(default)]
    pub keep_searching: bool,
}

pub struct GenerateQueryStep {
    model: Arc<dyn Model>,
}

#[async_trait]
impl Step for GenerateQueryStep {
    async fn execute(&self, state: &WorkflowState) -> Result<StepResult, StepflowError> {
        let topic: String = state.get_as("research_topic")?;
        let messages = [
            Message::system(render(QUERY_WRITER_INSTRUCTIONS, &[("topic", topic.as_str())])),
            Message::user("Generate a query for web search:"),
        ];
        let query: SearchQuery = generate_structured(
            self.model.as_ref(),
            &messages,
            &GenerationConfig::with_temperature(0.0),
        )
        .await?;

        Ok(StepResult::update(
            StateUpdate::new().set("research_query", query.query),
        ))
    }

    fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy::Propagate
    }
}

/// Runs the current query and bumps the loop counter
pub struct WebSearchStep {
    tool: Arc<dyn Tool>,
}

#[async_trait]
impl Step for WebSearchStep {
    async fn execute(&self, state: &WorkflowState) -> Result<StepResult, StepflowError> {
        let state: DeepResearchState = state.decode()?;
        let output = self
            .tool
            .execute(json!({"query": state.research_query, "count": 3}))
            .await?;
        let results: WebSearchResult = serde_json::from_value(output)?;
        log::info!(
            "Search #{} '{}' returned {} results",
            state.web_search_loop_count + 1,
            results.query,
            results.results.len()
        );

        let update = StateUpdate::new()
            .set("web_search_loop_count", state.web_search_loop_count + 1)
            .set("web_search_responses", serde_json::to_value(results)?);
        Ok(StepResult::update(update))
    }

    fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy::Propagate
    }
}

/// Creates or extends `summary` from the latest search results
pub struct SummarizeStep {
    model: Arc<dyn Model>,
}

#[async_trait]
impl Step for SummarizeStep {
    async fn execute(&self, state: &WorkflowState) -> Result<StepResult, StepflowError> {
        let state: DeepResearchState = state.decode()?;
        let Some(latest) = state.web_search_responses.last() else {
            log::debug!("No search results yet, keeping the current summary");
            return Ok(StepResult::update(StateUpdate::new()));
        };

        let sources = format_results(latest);
        let prompt = if state.summary.is_empty() {
            format!(
                "<User Input>\n{}\n</User Input>\n\n<Search Results>\n{}\n</Search Results>",
                state.research_topic, sources
            )
        } else {
            format!(
                "<User Input>\n{}\n</User Input>\n\n<Existing Summary>\n{}\n</Existing Summary>\n\n<New Search Results>\n{}\n</New Search Results>",
                state.research_topic, state.summary, sources
            )
        };
        let messages = [Message::system(SUMMARIZE_INSTRUCTIONS), Message::user(prompt)];
        let summary = generate_text(
            self.model.as_ref(),
            &messages,
            &GenerationConfig::with_temperature(0.1),
        )
        .await?;

        Ok(StepResult::update(
            StateUpdate::new().set("summary", summary.trim()),
        ))
    }

    fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy::embed("error")
    }
}

/// Picks the follow-up query and whether to keep searching
pub struct ReflectStep {
    model: Arc<dyn Model>,
}

#[async_trait]
impl Step for ReflectStep {
    async fn execute(&self, state: &WorkflowState) -> Result<StepResult, StepflowError> {
        let state: DeepResearchState = state.decode()?;
        let messages = [
            Message::system(render(
                REFLECTION_INSTRUCTIONS,
                &[("topic", state.research_topic.as_str())],
            )),
            Message::user(format!(
                "Reflect on our existing knowledge:\n===\n{}\n===\nAnd now identify a knowledge gap and generate a follow-up web search query:",
                state.summary
            )),
        ];
        let reflection: Reflection = generate_structured(
            self.model.as_ref(),
            &messages,
            &GenerationConfig::with_temperature(0.0),
        )
        .await?;
        log::debug!("Knowledge gap: {}", reflection.knowledge_gap);

        let update = StateUpdate::new()
            .set("research_query", reflection.follow_up_query)
            .set("keep_searching", reflection.keep_searching);
        Ok(StepResult::update(update))
    }

    fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy::Propagate
    }
}

/// Appends the list of sources to the summary
pub struct FinalizeSummaryStep;

#[async_trait]
impl Step for FinalizeSummaryStep {
    async fn execute(&self, state: &WorkflowState) -> Result<StepResult, StepflowError> {
        let state: DeepResearchState = state.decode()?;

        let mut seen = Vec::new();
        let mut sources = String::new();
        for result in state.web_search_responses.iter().flat_map(|r| &r.results) {
            if seen.contains(&result.url) {
                continue;
            }
            seen.push(result.url.clone());
            sources.push_str(&format!("* {} : {}\n", result.title, result.url));
        }

        let summary = format!("## Summary\n\n{}\n\n### Sources:\n{}", state.summary, sources);
        Ok(StepResult::update(StateUpdate::new().set("summary", summary)))
    }

    fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy::Propagate
    }
}

fn format_results(results: &WebSearchResult) -> String {
    results
        .results
        .iter()
        .map(|r| format!("Source: {}\nURL: {}\nContent: {}", r.title, r.url, r.description))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Loop-bound check first, then the flag; the fallback also searches again
pub fn research_router() -> ConditionRouter {
    ConditionRouter::new(WEB_SEARCH)
        .when(
            "web_search_loop_count > max_web_search_loop_count",
            FINALIZE_SUMMARY,
        )
        .when("keep_searching == true", WEB_SEARCH)
}

/// Build the research graph; requires a `web_search` tool in `tools`
pub async fn build_graph(
    planner: Arc<dyn Model>,
    summarizer: Arc<dyn Model>,
    tools: &ToolRegistry,
) -> Result<CompiledGraph, StepflowError> {
    let search = tools.require("web_search").await?;

    let mut builder = GraphBuilder::new("deep_research");
    builder
        .add_step(
            GENERATE_QUERY,
            GenerateQueryStep {
                model: planner.clone(),
            },
        )
        .add_step(WEB_SEARCH, WebSearchStep { tool: search })
        .add_step(SUMMARIZE, SummarizeStep { model: summarizer })
        .add_step(REFLECT, ReflectStep { model: planner })
        .add_step(FINALIZE_SUMMARY, FinalizeSummaryStep)
        .add_edge(GENERATE_QUERY, WEB_SEARCH)
        .add_edge(WEB_SEARCH, SUMMARIZE)
        .add_edge(SUMMARIZE, REFLECT)
        .add_conditional_edges(REFLECT, research_router())
        .add_edge(FINALIZE_SUMMARY, END)
        .set_entry_point(GENERATE_QUERY);
    Ok(builder.compile()?)
}
