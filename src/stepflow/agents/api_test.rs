// SPDX-License-Identifier: MIT

//! API test workflow
//!
//! For every endpoint of a reduced OpenAPI document: ask a model for a
//! request plan, execute it, and finally summarize all results.
//!
//! ```text
//! plan -> request -> (more endpoints? plan : finalize) -> END
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::prompts::{render, API_TEST_PLAN_INSTRUCTIONS, API_TEST_SUMMARY_INSTRUCTIONS};
use crate::adk::error::{GraphConfigError, StepflowError};
use crate::adk::model::{generate_structured, generate_text, GenerationConfig, Message, Model};
use crate::stepflow::graph::{
    CompiledGraph, ConditionRouter, ErrorPolicy, GraphBuilder, Step, StepResult, END,
};
use crate::stepflow::http::{ApiRequester, RequestOutcome, RequestPlan};
use crate::stepflow::openapi::ReducedOpenApiSpec;
use crate::stepflow::state::{ReducerType, StateRecord, StateUpdate, WorkflowState};

pub const PLAN: &str = "plan";
pub const REQUEST: &str = "request";
pub const FINALIZE: &str = "finalize";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApiTestState {
    pub token: Option<String>,
    pub open_api_spec: ReducedOpenApiSpec,
    pub endpoint_size: usize,
    pub endpoint_index: usize,
    pub request_plans: Vec<RequestPlan>,
    pub request_results: Vec<RequestOutcome>,
    pub summary: Option<String>,
    /// Last embedded step failure
    pub error: Option<String>,
}

impl StateRecord for ApiTestState {
    fn reducers() -> Vec<(&'static str, ReducerType)> {
        vec![
            ("request_plans", ReducerType::Append),
            ("request_results", ReducerType::Append),
        ]
    }
}

impl ApiTestState {
    /// Initial state covering every endpoint of `spec`
    pub fn new(spec: ReducedOpenApiSpec, token: Option<String>) -> Self {
        Self {
            token,
            endpoint_size: spec.endpoints.len(),
            open_api_spec: spec,
            ..Self::default()
        }
    }
}

/// Plans one request for the endpoint at `endpoint_index`
pub struct PlanStep {
    model: Arc<dyn Model>,
}

impl PlanStep {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Step for PlanStep {
    async fn execute(&self, state: &WorkflowState) -> Result<StepResult, StepflowError> {
        let state: ApiTestState = state.decode()?;
        let endpoint = state
            .open_api_spec
            .endpoints
            .get(state.endpoint_index)
            .ok_or_else(|| {
                StepflowError::other(format!("No endpoint at index {}", state.endpoint_index))
            })?;

        let api_spec = serde_json::to_string_pretty(endpoint)?;
        let instructions = render(API_TEST_PLAN_INSTRUCTIONS, &[("api_spec", api_spec.as_str())]);
        let messages = [
            Message::system(instructions),
            Message::user("Plan an API request"),
        ];
        let plan: RequestPlan = generate_structured(
            self.model.as_ref(),
            &messages,
            &GenerationConfig::with_temperature(0.1),
        )
        .await?;
        log::info!("Planned {} {} for {}", plan.method, plan.path, endpoint.name);

        let update = StateUpdate::new().set("request_plans", serde_json::to_value(plan)?);
        Ok(StepResult::goto(REQUEST, update))
    }

    fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy::Propagate
    }
}

/// Executes the most recent plan against the first server
pub struct RequestStep {
    requester: Arc<dyn ApiRequester>,
}

impl RequestStep {
    pub fn new(requester: Arc<dyn ApiRequester>) -> Self {
        Self { requester }
    }
}

#[async_trait]
impl Step for RequestStep {
    async fn execute(&self, state: &WorkflowState) -> Result<StepResult, StepflowError> {
        let state: ApiTestState = state.decode()?;

        let outcome = match (state.open_api_spec.server_url(), state.request_plans.last()) {
            (Some(server), Some(plan)) => self.requester.request(server, plan).await,
            (None, _) => RequestOutcome::failed("OpenAPI document has no server"),
            (_, None) => RequestOutcome::failed("No request plan to execute"),
        };

        let update = StateUpdate::new()
            .set("endpoint_index", state.endpoint_index + 1)
            .set("request_results", serde_json::to_value(outcome)?);
        Ok(StepResult::update(update))
    }

    fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy::embed("error")
    }
}

/// Summarizes every request result
pub struct FinalizeStep {
    model: Arc<dyn Model>,
}

impl FinalizeStep {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Step for FinalizeStep {
    async fn execute(&self, state: &WorkflowState) -> Result<StepResult, StepflowError> {
        let results = serde_json::to_string(state.get("request_results")?)?;
        let messages = [
            Message::system(API_TEST_SUMMARY_INSTRUCTIONS),
            Message::user(format!("Summarize the results: {}", results)),
        ];
        let summary = generate_text(
            self.model.as_ref(),
            &messages,
            &GenerationConfig::with_temperature(0.1),
        )
        .await?;

        Ok(StepResult::end(StateUpdate::new().set("summary", summary)))
    }

    fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy::Propagate
    }
}

/// Build the API test graph.
///
/// The loop continues while endpoints remain and no request failure has been
/// embedded into `error`.
pub fn build_graph(
    planner: Arc<dyn Model>,
    summarizer: Arc<dyn Model>,
    requester: Arc<dyn ApiRequester>,
) -> Result<CompiledGraph, GraphConfigError> {
    let mut builder = GraphBuilder::new("api_test");
    builder
        .add_step(PLAN, PlanStep::new(planner))
        .add_step(REQUEST, RequestStep::new(requester))
        .add_step(FINALIZE, FinalizeStep::new(summarizer))
        .add_command_edges(PLAN, [REQUEST])
        .add_conditional_edges(
            REQUEST,
            ConditionRouter::new(FINALIZE)
                .when("endpoint_index < endpoint_size and error == null", PLAN),
        )
        .add_command_edges(FINALIZE, [END])
        .set_entry_point(PLAN);
    builder.compile()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stepflow::graph::Router;

    #[test]
    fn test_schema_from_record() {
        let schema = ApiTestState::schema().unwrap();
        assert_eq!(
            schema.get("request_results").unwrap().reducer,
            ReducerType::Append
        );
        assert!(schema.contains("token"));
        assert!(schema.contains("error"));
    }

    #[test]
    fn test_initial_state_counts_endpoints() {
        let spec = ReducedOpenApiSpec {
            servers: vec![serde_json::json!({"url": "https://stg.example.com"})],
            description: None,
            endpoints: vec![],
        };
        let state = ApiTestState::new(spec, Some("token".to_string()));
        assert_eq!(state.endpoint_size, 0);
        assert_eq!(state.endpoint_index, 0);
        assert!(WorkflowState::from_record(&state).is_ok());
    }

    #[test]
    fn test_router_stops_on_embedded_error() {
        let router = ConditionRouter::new(FINALIZE)
            .when("endpoint_index < endpoint_size and error == null", PLAN);
        let state = WorkflowState::from_record(&ApiTestState {
            endpoint_size: 2,
            endpoint_index: 1,
            ..ApiTestState::default()
        })
        .unwrap();
        assert_eq!(router.route(&state).unwrap(), PLAN);

        let failed = state
            .merge(&StateUpdate::new().set("error", "decode failed"))
            .unwrap();
        assert_eq!(router.route(&failed).unwrap(), FINALIZE);
    }
}
