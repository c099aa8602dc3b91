// SPDX-License-Identifier: MIT

//! Single-use executor for one traversal of a compiled graph

use chrono::{DateTime, Utc};
use futures::stream::{self, Stream};

use super::compiled::CompiledGraph;
use super::step::{ErrorPolicy, StepResult};
use crate::adk::error::RunError;
use crate::stepflow::state::{StateUpdate, WorkflowState};

/// Lifecycle of a [`Run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Pending,
    /// The named step executes on the next poll
    Running(String),
    Terminated,
    Failed,
}

/// One step invocation as seen by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct StepEvent {
    pub step: String,
    pub update: StateUpdate,
    pub at: DateTime<Utc>,
}

/// A run of a [`CompiledGraph`].
///
/// Steps execute lazily, one per call to [`Run::next`]. A run cannot be
/// restarted: once terminated or failed it only yields `None`.
pub struct Run<'g> {
    graph: &'g CompiledGraph,
    state: WorkflowState,
    status: RunStatus,
    steps_taken: usize,
}

impl<'g> Run<'g> {
    pub(crate) fn new(graph: &'g CompiledGraph, initial: WorkflowState) -> Self {
        Self {
            graph,
            state: initial,
            status: RunStatus::Pending,
            steps_taken: 0,
        }
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    /// Current snapshot (the final one after termination)
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    /// Execute the next step and report its update
    pub async fn next(&mut self) -> Option<Result<StepEvent, RunError>> {
        let current = match &self.status {
            RunStatus::Terminated | RunStatus::Failed => return None,
            RunStatus::Pending => {
                log::info!(
                    "Starting run of '{}' at '{}'",
                    self.graph.name(),
                    self.graph.entry_point()
                );
                self.graph.entry_point().to_string()
            }
            RunStatus::Running(step) => step.clone(),
        };
        self.status = RunStatus::Running(current.clone());

        let result = self.advance(&current).await;
        if let Err(e) = &result {
            log::error!("Run of '{}' failed at '{}': {}", self.graph.name(), current, e);
            self.status = RunStatus::Failed;
        }
        Some(result)
    }

    async fn advance(&mut self, current: &str) -> Result<StepEvent, RunError> {
        if let Some(limit) = self.graph.options().step_limit {
            if self.steps_taken >= limit {
                return Err(RunError::StepLimitExceeded(limit));
            }
        }

        let step = self
            .graph
            .step(current)
            .ok_or_else(|| RunError::RouterResolution {
                step: current.to_string(),
                target: current.to_string(),
            })?;

        log::info!("Executing step: {}", current);
        let result = match step.execute(&self.state).await {
            Ok(result) => result,
            Err(e) => match step.error_policy() {
                ErrorPolicy::Propagate => {
                    return Err(RunError::StepInvocation {
                        step: current.to_string(),
                        source: Box::new(e),
                    })
                }
                ErrorPolicy::Embed { field } => {
                    log::warn!("Step '{}' failed, recording error in '{}': {}", current, field, e);
                    StepResult::update(StateUpdate::new().set(field, e.to_string()))
                }
            },
        };
        self.steps_taken += 1;

        self.state = self
            .state
            .merge(&result.update)
            .map_err(|source| RunError::State {
                step: current.to_string(),
                source,
            })?;

        let next = self.graph.resolve_next(current, result.next, &self.state)?;
        log::debug!("Transition {} -> {}", current, next);
        self.status = if self.graph.is_terminal(&next) {
            log::info!(
                "Run of '{}' finished after {} steps",
                self.graph.name(),
                self.steps_taken
            );
            RunStatus::Terminated
        } else {
            RunStatus::Running(next)
        };

        Ok(StepEvent {
            step: current.to_string(),
            update: result.update,
            at: Utc::now(),
        })
    }

    /// Adapt the run into a stream of step events
    pub fn into_stream(self) -> impl Stream<Item = Result<StepEvent, RunError>> + 'g {
        stream::unfold(self, |mut run| async move {
            let item = run.next().await?;
            Some((item, run))
        })
    }

    /// Final snapshot, available once the run has terminated
    pub fn into_final_state(self) -> Option<WorkflowState> {
        match self.status {
            RunStatus::Terminated => Some(self.state),
            _ => None,
        }
    }

    /// Last snapshot regardless of how the run ended
    pub fn into_state(self) -> WorkflowState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::error::StepflowError;
    use crate::stepflow::graph::builder::GraphBuilder;
    use crate::stepflow::graph::compiled::RunOptions;
    use crate::stepflow::graph::router::ConditionRouter;
    use crate::stepflow::graph::step::step_fn;
    use crate::stepflow::graph::END;
    use crate::stepflow::state::{FieldType, ReducerType, StateSchema};
    use futures::StreamExt;
    use serde_json::json;

    fn schema() -> StateSchema {
        StateSchema::new()
            .field("count", FieldType::Number, ReducerType::Overwrite, None)
            .field("error", FieldType::String, ReducerType::Overwrite, None)
    }

    fn counting_loop(max: i64) -> CompiledGraph {
        let mut builder = GraphBuilder::new("loop");
        builder
            .add_step(
                "inc",
                step_fn(ErrorPolicy::Propagate, |state: WorkflowState| async move {
                    let count: i64 = state.get_as("count")?;
                    Ok::<_, StepflowError>(StepResult::update(
                        StateUpdate::new().set("count", count + 1),
                    ))
                }),
            )
            .add_conditional_edges(
                "inc",
                ConditionRouter::new("inc").when(&format!("count >= {}", max), END),
            )
            .set_entry_point("inc");
        builder.compile().unwrap()
    }

    #[tokio::test]
    async fn test_run_yields_one_event_per_step() {
        let graph = counting_loop(3);
        let mut run = graph.stream(WorkflowState::with_defaults(schema()).unwrap());
        assert_eq!(run.status(), &RunStatus::Pending);

        let mut steps = Vec::new();
        while let Some(event) = run.next().await {
            steps.push(event.unwrap());
        }

        assert_eq!(steps.len(), 3);
        assert!(steps.iter().all(|e| e.step == "inc"));
        assert_eq!(steps[2].update.get("count"), Some(&json!(3)));
        assert_eq!(run.status(), &RunStatus::Terminated);
        assert!(run.next().await.is_none());
        assert_eq!(run.into_final_state().unwrap().get("count").unwrap(), &json!(3));
    }

    #[tokio::test]
    async fn test_into_stream() {
        let graph = counting_loop(2);
        let events: Vec<_> = graph
            .stream(WorkflowState::with_defaults(schema()).unwrap())
            .into_stream()
            .collect()
            .await;
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.is_ok()));
    }

    #[tokio::test]
    async fn test_step_limit() {
        let graph = counting_loop(100).with_options(RunOptions::with_step_limit(5));
        let err = graph
            .invoke(WorkflowState::with_defaults(schema()).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::StepLimitExceeded(5)));
    }

    #[tokio::test]
    async fn test_propagate_policy_halts() {
        let mut builder = GraphBuilder::new("fail");
        builder
            .add_step(
                "boom",
                step_fn(ErrorPolicy::Propagate, |_state| async {
                    Err(StepflowError::other("boom"))
                }),
            )
            .add_edge("boom", END)
            .set_entry_point("boom");
        let graph = builder.compile().unwrap();

        let mut run = graph.stream(WorkflowState::with_defaults(schema()).unwrap());
        let err = run.next().await.unwrap().unwrap_err();
        assert!(matches!(err, RunError::StepInvocation { ref step, .. } if step == "boom"));
        assert_eq!(run.status(), &RunStatus::Failed);
        assert!(run.next().await.is_none());
        assert!(run.into_final_state().is_none());
    }

    #[tokio::test]
    async fn test_embed_policy_continues() {
        let mut builder = GraphBuilder::new("embed");
        builder
            .add_step(
                "boom",
                step_fn(ErrorPolicy::embed("error"), |_state| async {
                    Err(StepflowError::other("connection refused"))
                }),
            )
            .add_edge("boom", END)
            .set_entry_point("boom");
        let graph = builder.compile().unwrap();

        let state = graph
            .invoke(WorkflowState::with_defaults(schema()).unwrap())
            .await
            .unwrap();
        assert_eq!(state.get("error").unwrap(), &json!("connection refused"));
    }
}
