// SPDX-License-Identifier: MIT

//! Graph builder - collects steps and edges, then validates them into a
//! [`CompiledGraph`]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use super::compiled::{CompiledGraph, Edge, RunOptions};
use super::router::Router;
use super::step::{ErrorPolicy, Step};
use super::END;
use crate::adk::error::GraphConfigError;

/// Explicit factory for a step graph.
///
/// Nothing is validated until [`GraphBuilder::compile`], so steps and edges
/// can be declared in any order.
pub struct GraphBuilder {
    name: String,
    steps: Vec<(String, Arc<dyn Step>)>,
    edges: Vec<(String, Edge)>,
    entry_point: Option<String>,
    terminals: Vec<String>,
    options: RunOptions,
}

impl GraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            edges: Vec::new(),
            entry_point: None,
            terminals: vec![END.to_string()],
            options: RunOptions::default(),
        }
    }

    pub fn add_step(&mut self, name: impl Into<String>, step: impl Step + 'static) -> &mut Self {
        self.add_shared_step(name, Arc::new(step))
    }

    pub fn add_shared_step(&mut self, name: impl Into<String>, step: Arc<dyn Step>) -> &mut Self {
        self.steps.push((name.into(), step));
        self
    }

    /// `from` always proceeds to `to`
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.push((from.into(), Edge::Direct(to.into())));
        self
    }

    /// `from`'s successor is chosen by `router` over the post-update state
    pub fn add_conditional_edges(
        &mut self,
        from: impl Into<String>,
        router: impl Router + 'static,
    ) -> &mut Self {
        self.edges
            .push((from.into(), Edge::Conditional(Arc::new(router))));
        self
    }

    /// `from` picks its own successor through `StepResult::next`; `targets`
    /// lists where it may go
    pub fn add_command_edges<I, S>(&mut self, from: impl Into<String>, targets: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let targets = targets.into_iter().map(Into::into).collect();
        self.edges.push((from.into(), Edge::Command(targets)));
        self
    }

    pub fn set_entry_point(&mut self, name: impl Into<String>) -> &mut Self {
        self.entry_point = Some(name.into());
        self
    }

    /// Declare an extra terminal marker besides `END`
    pub fn add_terminal(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        if !self.terminals.contains(&name) {
            self.terminals.push(name);
        }
        self
    }

    pub fn with_options(&mut self, options: RunOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Validate the definition and freeze it
    pub fn compile(self) -> Result<CompiledGraph, GraphConfigError> {
        if self.steps.is_empty() {
            return Err(GraphConfigError::EmptyGraph);
        }

        let terminals: HashSet<String> = self.terminals.iter().cloned().collect();
        let mut order = Vec::with_capacity(self.steps.len());
        let mut steps: HashMap<String, Arc<dyn Step>> = HashMap::new();
        for (name, step) in self.steps {
            if terminals.contains(&name) {
                return Err(GraphConfigError::ReservedName(name));
            }
            if steps.contains_key(&name) {
                return Err(GraphConfigError::DuplicateStep(name));
            }
            order.push(name.clone());
            steps.insert(name, step);
        }

        let entry_point = self.entry_point.ok_or(GraphConfigError::MissingEntryPoint)?;
        if !steps.contains_key(&entry_point) {
            return Err(GraphConfigError::UnknownEntryPoint(entry_point));
        }

        let is_known = |name: &str| steps.contains_key(name) || terminals.contains(name);
        let mut edges: HashMap<String, Edge> = HashMap::new();
        for (from, edge) in self.edges {
            if !steps.contains_key(&from) {
                return Err(GraphConfigError::UnknownSource(from));
            }
            if edges.contains_key(&from) {
                return Err(GraphConfigError::ConflictingEdges(from));
            }
            if let Edge::Conditional(router) = &edge {
                router
                    .validate()
                    .map_err(|message| GraphConfigError::InvalidCondition {
                        step: from.clone(),
                        message,
                    })?;
            }
            if let Some(to) = edge.targets().into_iter().find(|t| !is_known(t)) {
                return Err(GraphConfigError::DanglingEdge { from, to });
            }
            edges.insert(from, edge);
        }

        if let Some(name) = order.iter().find(|name| !edges.contains_key(*name)) {
            return Err(GraphConfigError::MissingEdge(name.clone()));
        }

        for name in &order {
            let embeds = matches!(steps[name].error_policy(), ErrorPolicy::Embed { .. });
            if embeds && matches!(edges.get(name), Some(Edge::Command(_))) {
                return Err(GraphConfigError::EmbedWithoutRoute(name.clone()));
            }
        }

        let unreachable = unreachable_steps(&order, &entry_point, &edges);
        if !unreachable.is_empty() {
            return Err(GraphConfigError::Unreachable(unreachable));
        }

        log::debug!(
            "Compiled graph '{}' with {} steps (entry: {})",
            self.name,
            order.len(),
            entry_point
        );

        Ok(CompiledGraph {
            name: self.name,
            steps,
            order,
            edges,
            entry_point,
            terminals,
            options: self.options,
        })
    }
}

fn unreachable_steps(
    order: &[String],
    entry_point: &str,
    edges: &HashMap<String, Edge>,
) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    seen.insert(entry_point.to_string());
    queue.push_back(entry_point.to_string());

    while let Some(current) = queue.pop_front() {
        if let Some(edge) = edges.get(&current) {
            for target in edge.targets() {
                if seen.insert(target.clone()) {
                    queue.push_back(target);
                }
            }
        }
    }

    order
        .iter()
        .filter(|name| !seen.contains(*name))
        .cloned()
        .collect()
}
