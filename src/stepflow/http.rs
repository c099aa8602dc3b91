// SPDX-License-Identifier: MIT

//! HTTP request collaborator used by the API test workflow

use async_trait::async_trait;
use reqwest::{Client, Method};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::adk::error::StepflowError;

/// A single planned request against an API server
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RequestPlan {
    /// HTTP method, e.g. GET or POST
    pub method: String,
    /// Path relative to the server URL, e.g. /banners/{id} with the id filled in
    pub path: String,
    /// Query string parameters
    #[serde(default)]
    pub query_params: Option<Map<String, Value>>,
    /// JSON request body
    #[serde(default)]
    pub json_body: Option<Value>,
    /// Extra request headers
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
}

/// Result of executing a [`RequestPlan`]; transport failures are data, not errors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RequestOutcome {
    Completed {
        endpoint: String,
        is_success: bool,
        status_code: u16,
        /// Parsed JSON when possible, raw text otherwise
        body: Value,
    },
    Failed {
        error: String,
    },
}

impl RequestOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { is_success: true, .. })
    }
}

#[async_trait]
pub trait ApiRequester: Send + Sync {
    async fn request(&self, server_url: &str, plan: &RequestPlan) -> RequestOutcome;
}

/// reqwest-backed requester with a client timeout and optional bearer token
pub struct HttpRequester {
    client: Client,
    token: Option<String>,
}

impl HttpRequester {
    pub fn new(timeout: Duration, token: Option<String>) -> Result<Self, StepflowError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, token })
    }

    async fn send(&self, server_url: &str, plan: &RequestPlan) -> Result<RequestOutcome, StepflowError> {
        let method = Method::from_bytes(plan.method.trim().to_uppercase().as_bytes())
            .map_err(|_| StepflowError::other(format!("Invalid HTTP method: {}", plan.method)))?;
        let url = join_url(server_url, &plan.path);
        let endpoint = format!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(params) = &plan.query_params {
            let pairs: Vec<(String, String)> = params
                .iter()
                .map(|(k, v)| (k.clone(), query_value(v)))
                .collect();
            request = request.query(&pairs);
        }
        if let Some(body) = &plan.json_body {
            request = request.json(body);
        }
        if let Some(headers) = &plan.headers {
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        log::info!("Requesting {}", endpoint);
        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(RequestOutcome::Completed {
            endpoint,
            is_success: status.is_success(),
            status_code: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ApiRequester for HttpRequester {
    async fn request(&self, server_url: &str, plan: &RequestPlan) -> RequestOutcome {
        match self.send(server_url, plan).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("Request {} {} failed: {}", plan.method, plan.path, e);
                RequestOutcome::failed(e.to_string())
            }
        }
    }
}

fn join_url(server_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        server_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://api.test/", "/banners"), "https://api.test/banners");
        assert_eq!(join_url("https://api.test", "banners"), "https://api.test/banners");
        assert_eq!(join_url("https://api.test", "https://other/x"), "https://other/x");
    }

    #[test]
    fn test_outcome_shapes() {
        let completed = RequestOutcome::Completed {
            endpoint: "GET https://api.test/banners".to_string(),
            is_success: true,
            status_code: 200,
            body: json!({"items": []}),
        };
        let value = serde_json::to_value(&completed).unwrap();
        assert_eq!(value["status_code"], 200);
        assert!(value.get("error").is_none());

        let failed = serde_json::to_value(RequestOutcome::failed("timeout")).unwrap();
        assert_eq!(failed, json!({"error": "timeout"}));

        let parsed: RequestOutcome = serde_json::from_value(failed).unwrap();
        assert!(!parsed.is_success());
    }

    #[test]
    fn test_plan_from_model_json() {
        let plan: RequestPlan =
            serde_json::from_str(r#"{"method": "get", "path": "/banners"}"#).unwrap();
        assert_eq!(plan.method, "get");
        assert!(plan.query_params.is_none());
    }

    #[tokio::test]
    async fn test_invalid_method_becomes_failed_outcome() {
        let requester = HttpRequester::new(Duration::from_secs(1), None).unwrap();
        let plan = RequestPlan {
            method: "NOT A METHOD".to_string(),
            path: "/x".to_string(),
            ..RequestPlan::default()
        };
        let outcome = requester.request("http://127.0.0.1:1", &plan).await;
        assert!(matches!(outcome, RequestOutcome::Failed { .. }));
    }
}
