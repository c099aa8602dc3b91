// SPDX-License-Identifier: MIT

//! Validated, immutable step graph

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::router::Router;
use super::run::Run;
use super::step::Step;
use super::START;
use crate::adk::error::RunError;
use crate::stepflow::state::WorkflowState;

/// Outgoing edge configuration of a single step
pub(crate) enum Edge {
    Direct(String),
    Conditional(Arc<dyn Router>),
    /// The step must pick its successor itself; the list is for validation
    Command(Vec<String>),
}

impl Edge {
    pub(crate) fn targets(&self) -> Vec<String> {
        match self {
            Edge::Direct(to) => vec![to.clone()],
            Edge::Conditional(router) => router.targets(),
            Edge::Command(targets) => targets.clone(),
        }
    }
}

/// Per-graph execution options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Abort with `RunError::StepLimitExceeded` after this many steps.
    /// Unbounded when `None`; loops are expected to carry their own counters.
    pub step_limit: Option<usize>,
}

impl RunOptions {
    pub fn with_step_limit(limit: usize) -> Self {
        Self {
            step_limit: Some(limit),
        }
    }
}

/// A graph that passed validation and can be run any number of times
pub struct CompiledGraph {
    pub(crate) name: String,
    pub(crate) steps: HashMap<String, Arc<dyn Step>>,
    pub(crate) order: Vec<String>,
    pub(crate) edges: HashMap<String, Edge>,
    pub(crate) entry_point: String,
    pub(crate) terminals: HashSet<String>,
    pub(crate) options: RunOptions,
}

impl CompiledGraph {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start a run; nothing executes until the run is polled
    pub fn stream(&self, initial: WorkflowState) -> Run<'_> {
        Run::new(self, initial)
    }

    /// Run to completion and return the final state
    pub async fn invoke(&self, initial: WorkflowState) -> Result<WorkflowState, RunError> {
        let mut run = self.stream(initial);
        while let Some(event) = run.next().await {
            event?;
        }
        Ok(run.into_state())
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Steps in declaration order
    pub fn step_names(&self) -> &[String] {
        &self.order
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn is_terminal(&self, name: &str) -> bool {
        self.terminals.contains(name)
    }

    pub(crate) fn step(&self, name: &str) -> Option<&Arc<dyn Step>> {
        self.steps.get(name)
    }

    /// Pick the successor of `step`.
    ///
    /// An explicit directive wins over any configured edge; otherwise the
    /// direct target or the router result is used. Command-routed steps
    /// must always return a directive.
    pub(crate) fn resolve_next(
        &self,
        step: &str,
        directive: Option<String>,
        state: &WorkflowState,
    ) -> Result<String, RunError> {
        let target = match (directive, self.edges.get(step)) {
            (Some(next), _) => next,
            (None, Some(Edge::Direct(to))) => to.clone(),
            (None, Some(Edge::Conditional(router))) => {
                router.route(state).map_err(|source| RunError::State {
                    step: step.to_string(),
                    source,
                })?
            }
            (None, Some(Edge::Command(_))) | (None, None) => {
                return Err(RunError::NoRoute(step.to_string()))
            }
        };

        if self.steps.contains_key(&target) || self.terminals.contains(&target) {
            Ok(target)
        } else {
            Err(RunError::RouterResolution {
                step: step.to_string(),
                target,
            })
        }
    }

    /// Render the graph as a Mermaid flowchart
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("flowchart TD\n");
        out.push_str(&format!("    {}([start]) --> {}\n", START, self.entry_point));

        for name in &self.order {
            let Some(edge) = self.edges.get(name) else {
                continue;
            };
            match edge {
                Edge::Direct(to) => {
                    out.push_str(&format!("    {} --> {}\n", name, mermaid_id(self, to)));
                }
                Edge::Conditional(_) | Edge::Command(_) => {
                    for to in edge.targets() {
                        out.push_str(&format!("    {} -.-> {}\n", name, mermaid_id(self, &to)));
                    }
                }
            }
        }

        let mut terminals: Vec<&String> = self.terminals.iter().collect();
        terminals.sort();
        for terminal in terminals {
            out.push_str(&format!("    {}([end])\n", terminal));
        }
        out
    }
}

fn mermaid_id(graph: &CompiledGraph, name: &str) -> String {
    if graph.is_terminal(name) {
        name.to_string()
    } else {
        name.replace(' ', "_")
    }
}
