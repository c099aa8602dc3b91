// SPDX-License-Identifier: MIT

//! Step trait and the result a step hands back to the executor

use async_trait::async_trait;
use std::future::Future;

use super::END;
use crate::adk::error::StepflowError;
use crate::stepflow::state::{StateUpdate, WorkflowState};

/// What the executor does when a step returns an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Halt the run with `RunError::StepInvocation`
    Propagate,
    /// Write the error text into `field` and keep routing along configured edges
    Embed { field: String },
}

impl ErrorPolicy {
    pub fn embed(field: impl Into<String>) -> Self {
        Self::Embed {
            field: field.into(),
        }
    }
}

/// Partial update plus an optional explicit successor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepResult {
    pub update: StateUpdate,
    /// Explicit next step; overrides any configured edge
    pub next: Option<String>,
}

impl StepResult {
    /// Follow the configured edge after applying `update`
    pub fn update(update: StateUpdate) -> Self {
        Self { update, next: None }
    }

    /// Route to `next` unconditionally after applying `update`
    pub fn goto(next: impl Into<String>, update: StateUpdate) -> Self {
        Self {
            update,
            next: Some(next.into()),
        }
    }

    /// Finish the run after applying `update`
    pub fn end(update: StateUpdate) -> Self {
        Self::goto(END, update)
    }
}

/// A named unit of work in a step graph.
///
/// Steps receive a read-only snapshot and return an update; collaborators
/// (models, HTTP clients, tools) are owned by the step value itself.
#[async_trait]
pub trait Step: Send + Sync {
    async fn execute(&self, state: &WorkflowState) -> Result<StepResult, StepflowError>;

    /// Every step states how its failures are handled
    fn error_policy(&self) -> ErrorPolicy;
}

/// Adapter turning an async closure into a [`Step`]
pub struct FnStep<F> {
    policy: ErrorPolicy,
    func: F,
}

/// Build a step from a closure that receives an owned snapshot
pub fn step_fn<F, Fut>(policy: ErrorPolicy, func: F) -> FnStep<F>
where
    F: Fn(WorkflowState) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StepResult, StepflowError>> + Send,
{
    FnStep { policy, func }
}

#[async_trait]
impl<F, Fut> Step for FnStep<F>
where
    F: Fn(WorkflowState) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StepResult, StepflowError>> + Send,
{
    async fn execute(&self, state: &WorkflowState) -> Result<StepResult, StepflowError> {
        (self.func)(state.clone()).await
    }

    fn error_policy(&self) -> ErrorPolicy {
        self.policy.clone()
    }
}
