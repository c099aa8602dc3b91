// SPDX-License-Identifier: MIT

//! OpenAPI reduction
//!
//! Shrinks an OpenAPI 3 document to the servers of one environment and the
//! operations carrying the requested tags, in a shape small enough to hand to
//! a model as planning context.

pub mod deref;
pub mod reducer;

pub use reducer::{reduce_openapi_document, reduce_openapi_spec};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One operation of the reduced document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReducedEndpoint {
    /// `METHOD /path`, e.g. `GET /banners/{id}`
    pub name: String,
    pub description: Option<String>,
    /// Description, parameters, request body and success response
    pub docs: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReducedOpenApiSpec {
    /// Server objects (`url`, `description`, ...) matching the environment
    pub servers: Vec<Value>,
    pub description: Option<String>,
    pub endpoints: Vec<ReducedEndpoint>,
}

impl ReducedOpenApiSpec {
    /// URL of the first matching server
    pub fn server_url(&self) -> Option<&str> {
        self.servers.first().and_then(|s| s["url"].as_str())
    }
}
