// SPDX-License-Identifier: MIT

//! Step graph: definition, validation and execution

pub mod builder;
pub mod compiled;
pub mod diagram;
pub mod router;
pub mod run;
pub mod step;

/// Terminal marker every graph accepts
pub const END: &str = "__end__";

/// Name used for the implicit start node in diagrams
pub const START: &str = "__start__";

pub use builder::GraphBuilder;
pub use compiled::{CompiledGraph, RunOptions};
pub use diagram::write_diagram;
pub use router::{router_fn, ConditionRouter, FnRouter, Router};
pub use run::{Run, RunStatus, StepEvent};
pub use step::{step_fn, ErrorPolicy, FnStep, Step, StepResult};
