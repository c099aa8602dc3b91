// SPDX-License-Identifier: MIT

pub mod agents;
pub mod condition;
pub mod config;
pub mod graph;
pub mod http;
pub mod openapi;
pub mod registry;
pub mod state;
pub mod tools;
