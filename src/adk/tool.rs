// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::adk::error::StepflowError;

/// Trait for tools that steps can call.
///
/// `name()` and `description()` return `&str` and `schema()` returns `&Value`
/// so implementations keep them in fields (or a `Lazy` static) instead of
/// rebuilding them per call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool name (unique within a registry)
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does
    fn description(&self) -> &str;

    /// Returns the JSON schema for the tool's input parameters
    fn schema(&self) -> &Value;

    /// Execute the tool with the given input and return the result
    async fn execute(&self, input: Value) -> Result<Value, StepflowError>;
}

/// Read a required string argument from tool input
pub fn required_str<'a>(input: &'a Value, key: &str) -> Result<&'a str, StepflowError> {
    input[key]
        .as_str()
        .ok_or_else(|| StepflowError::other(format!("Missing '{}' parameter", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_str() {
        let input = json!({"query": "rust", "count": 3});
        assert_eq!(required_str(&input, "query").unwrap(), "rust");
        assert!(required_str(&input, "count").is_err());
        assert!(required_str(&input, "missing").is_err());
    }
}
