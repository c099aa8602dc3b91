// SPDX-License-Identifier: MIT

//! Router predicates for conditional edges

use crate::adk::error::{ConditionError, StateError};
use crate::stepflow::condition::{self, Expression};
use crate::stepflow::state::WorkflowState;

/// Chooses the successor of a step from the post-update state
pub trait Router: Send + Sync {
    /// Name of the next step or terminal marker
    fn route(&self, state: &WorkflowState) -> Result<String, StateError>;

    /// Every name `route` may return; used for validation and diagrams
    fn targets(&self) -> Vec<String>;

    /// Structural check run once at graph compile time
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Closure-backed router with an explicit target list
pub struct FnRouter<F> {
    targets: Vec<String>,
    func: F,
}

pub fn router_fn<F, I, S>(targets: I, func: F) -> FnRouter<F>
where
    F: Fn(&WorkflowState) -> String + Send + Sync,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    FnRouter {
        targets: targets.into_iter().map(Into::into).collect(),
        func,
    }
}

impl<F> Router for FnRouter<F>
where
    F: Fn(&WorkflowState) -> String + Send + Sync,
{
    fn route(&self, state: &WorkflowState) -> Result<String, StateError> {
        Ok((self.func)(state))
    }

    fn targets(&self) -> Vec<String> {
        self.targets.clone()
    }
}

struct Branch {
    source: String,
    condition: Result<Expression, ConditionError>,
    target: String,
}

/// Ordered `(condition, target)` branches; the first match wins
pub struct ConditionRouter {
    branches: Vec<Branch>,
    default: String,
}

impl ConditionRouter {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            branches: Vec::new(),
            default: default.into(),
        }
    }

    /// Append a branch. Parse errors are reported by `validate`.
    pub fn when(mut self, condition: &str, target: impl Into<String>) -> Self {
        self.branches.push(Branch {
            source: condition.to_string(),
            condition: condition::parse(condition),
            target: target.into(),
        });
        self
    }
}

impl Router for ConditionRouter {
    /// Every field a branch reads must be declared, even in branches that
    /// are never reached; a misspelled name is an error, not a null.
    fn route(&self, state: &WorkflowState) -> Result<String, StateError> {
        let parsed = self.branches.iter().filter_map(|b| b.condition.as_ref().ok());
        for path in parsed.flat_map(Expression::fields) {
            let root = path.split('.').next().unwrap_or(path);
            state.get(root)?;
        }

        for branch in &self.branches {
            if let Ok(expr) = &branch.condition {
                if condition::evaluate(expr, state) {
                    log::debug!("Condition '{}' matched -> {}", branch.source, branch.target);
                    return Ok(branch.target.clone());
                }
            }
        }
        Ok(self.default.clone())
    }

    fn targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = Vec::with_capacity(self.branches.len() + 1);
        for t in self
            .branches
            .iter()
            .map(|b| &b.target)
            .chain(std::iter::once(&self.default))
        {
            if !targets.contains(t) {
                targets.push(t.clone());
            }
        }
        targets
    }

    fn validate(&self) -> Result<(), String> {
        for branch in &self.branches {
            if let Err(e) = &branch.condition {
                return Err(e.to_string());
            }
        }
        Ok(())
    }
}
