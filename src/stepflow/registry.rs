// SPDX-License-Identifier: MIT

use crate::adk::error::StepflowError;
use crate::adk::tool::Tool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared name → tool map handed to workflow factories
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register(&self, tool: Arc<dyn Tool>) {
        let mut tools = self.tools.write().await;
        log::debug!("Registered tool: {}", tool.name());
        tools.insert(tool.name().to_string(), tool);
    }

    pub async fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let tools = self.tools.read().await;
        tools.get(name).cloned()
    }

    /// Like [`ToolRegistry::get`], but a missing tool is an error
    pub async fn require(&self, name: &str) -> Result<Arc<dyn Tool>, StepflowError> {
        self.get(name)
            .await
            .ok_or_else(|| StepflowError::tool_not_found(name))
    }

    pub async fn names(&self) -> Vec<String> {
        let tools = self.tools.read().await;
        let mut names: Vec<String> = tools.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use once_cell::sync::Lazy;
    use serde_json::{json, Value};

    static ECHO_SCHEMA: Lazy<Value> = Lazy::new(|| {
        json!({
            "type": "object",
            "properties": {}
        })
    });

    struct EchoTool {
        name: String,
    }

    impl EchoTool {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
            }
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "Returns its input"
        }

        fn schema(&self) -> &Value {
            &ECHO_SCHEMA
        }

        async fn execute(&self, input: Value) -> Result<Value, StepflowError> {
            Ok(input)
        }
    }

    #[tokio::test]
    async fn test_register_and_require() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::new("web_search"))).await;

        let tool = registry.require("web_search").await.unwrap();
        assert_eq!(tool.execute(json!({"q": 1})).await.unwrap(), json!({"q": 1}));
    }

    #[tokio::test]
    async fn test_require_missing_tool() {
        let registry = ToolRegistry::new();
        let err = registry.require("web_scrape").await.err().unwrap();
        assert!(matches!(err, StepflowError::ToolNotFound { name } if name == "web_scrape"));
        assert!(registry.get("web_scrape").await.is_none());
    }

    #[tokio::test]
    async fn test_clones_share_tools() {
        let registry = ToolRegistry::new();
        let cloned = registry.clone();
        cloned.register(Arc::new(EchoTool::new("write_file"))).await;
        cloned.register(Arc::new(EchoTool::new("web_scrape"))).await;

        assert_eq!(
            registry.names().await,
            vec!["web_scrape".to_string(), "write_file".to_string()]
        );
    }
}
