// SPDX-License-Identifier: MIT

use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use super::deref::dereference;
use super::{ReducedEndpoint, ReducedOpenApiSpec};
use crate::adk::error::OpenApiError;

const METHODS: [&str; 7] = ["get", "post", "put", "patch", "delete", "head", "options"];

/// Read an OpenAPI document (YAML or JSON) from `path` and reduce it
pub fn reduce_openapi_spec(
    path: impl AsRef<Path>,
    server_env: &str,
    tags: &[String],
    dereference_refs: bool,
) -> Result<ReducedOpenApiSpec, OpenApiError> {
    let content = fs::read_to_string(path.as_ref())?;
    // YAML is a superset of JSON, so one parser covers both. Going through
    // serde_yaml::Value turns unquoted status codes (`200:`) into string keys.
    let yaml: serde_yaml::Value = serde_yaml::from_str(&content)?;
    let doc = serde_json::to_value(yaml)?;
    reduce_openapi_document(&doc, server_env, tags, dereference_refs)
}

/// Reduce an already parsed document.
///
/// Servers whose `description` or `url` mentions `server_env`
/// (case-insensitive) are kept; none matching is an error. An empty `tags`
/// slice keeps every operation.
pub fn reduce_openapi_document(
    doc: &Value,
    server_env: &str,
    tags: &[String],
    dereference_refs: bool,
) -> Result<ReducedOpenApiSpec, OpenApiError> {
    let servers = matching_servers(doc, server_env);
    if servers.is_empty() {
        return Err(OpenApiError::NoMatchingServer(server_env.to_string()));
    }

    let mut endpoints = Vec::new();
    if let Some(paths) = doc["paths"].as_object() {
        for (path, item) in paths {
            let shared_params = item.get("parameters");
            for method in METHODS {
                let Some(operation) = item.get(method) else {
                    continue;
                };
                if !has_any_tag(operation, tags) {
                    continue;
                }
                let operation = if dereference_refs {
                    dereference(operation, doc)?
                } else {
                    operation.clone()
                };
                let params = match (shared_params, dereference_refs) {
                    (Some(p), true) => Some(dereference(p, doc)?),
                    (p, _) => p.cloned(),
                };
                endpoints.push(reduce_operation(method, path, &operation, params.as_ref()));
            }
        }
    }

    log::debug!(
        "Reduced OpenAPI document to {} servers and {} endpoints (env: {}, tags: {:?})",
        servers.len(),
        endpoints.len(),
        server_env,
        tags
    );

    Ok(ReducedOpenApiSpec {
        servers,
        description: doc["info"]["description"].as_str().map(str::to_string),
        endpoints,
    })
}

fn matching_servers(doc: &Value, server_env: &str) -> Vec<Value> {
    let needle = server_env.to_lowercase();
    let mentions = |server: &Value, key: &str| {
        server[key]
            .as_str()
            .map(|s| s.to_lowercase().contains(&needle))
            .unwrap_or(false)
    };
    doc["servers"]
        .as_array()
        .map(|servers| {
            servers
                .iter()
                .filter(|s| mentions(s, "description") || mentions(s, "url"))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

fn has_any_tag(operation: &Value, tags: &[String]) -> bool {
    if tags.is_empty() {
        return true;
    }
    operation["tags"]
        .as_array()
        .map(|op_tags| {
            op_tags
                .iter()
                .filter_map(Value::as_str)
                .any(|t| tags.iter().any(|wanted| wanted == t))
        })
        .unwrap_or(false)
}

fn reduce_operation(
    method: &str,
    path: &str,
    operation: &Value,
    shared_params: Option<&Value>,
) -> ReducedEndpoint {
    let description = operation["description"]
        .as_str()
        .or_else(|| operation["summary"].as_str())
        .map(str::to_string);

    let mut docs = Map::new();
    if let Some(d) = &description {
        docs.insert("description".to_string(), Value::String(d.clone()));
    }

    let mut parameters: Vec<Value> = shared_params
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if let Some(op_params) = operation["parameters"].as_array() {
        parameters.extend(op_params.iter().cloned());
    }
    if !parameters.is_empty() {
        docs.insert("parameters".to_string(), Value::Array(parameters));
    }

    if let Some(body) = operation.get("requestBody") {
        docs.insert("requestBody".to_string(), body.clone());
    }

    if let Some((code, response)) = success_response(operation) {
        let mut responses = Map::new();
        responses.insert(code, response.clone());
        docs.insert("responses".to_string(), Value::Object(responses));
    }

    ReducedEndpoint {
        name: format!("{} {}", method.to_uppercase(), path),
        description,
        docs: Value::Object(docs),
    }
}

/// The lowest 2xx response, if any
fn success_response(operation: &Value) -> Option<(String, &Value)> {
    let responses = operation["responses"].as_object()?;
    let mut codes: Vec<&String> = responses.keys().filter(|c| c.starts_with('2')).collect();
    codes.sort();
    let code = codes.first()?;
    responses.get(*code).map(|r| ((*code).clone(), r))
}
