// SPDX-License-Identifier: MIT

//! Condition evaluation for declarative routers
//!
//! Conditions are simple expressions like:
//! - `intent == 'search'`
//! - `endpoint_index < endpoint_size`
//! - `keep_searching == true and web_search_loop_count <= 3`

mod ast;
mod evaluator;
mod parser;

pub use ast::{CompareOp, Expression, Literal, Operand};
pub use evaluator::evaluate;
pub use parser::parse;
