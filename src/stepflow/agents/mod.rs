// SPDX-License-Identifier: MIT

//! Concrete workflows built on the step graph

pub mod api_test;
pub mod deep_research;
pub mod prompts;
pub mod web_summary;
