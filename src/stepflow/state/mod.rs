// SPDX-License-Identifier: MIT

//! State management for step graphs
//!
//! This module provides:
//! - `StateSchema` - defines the shape and types of workflow state
//! - `StateRecord` - typed records that derive their schema from `Default`
//! - `WorkflowState` - immutable snapshots with reducer-aware merging
//! - `StateUpdate` - the partial mapping a step returns

mod schema;
mod store;
mod update;

pub use schema::{FieldType, ReducerType, StateFieldDef, StateSchema};
pub use store::{StateRecord, WorkflowState};
pub use update::StateUpdate;
