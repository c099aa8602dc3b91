// SPDX-License-Identifier: MIT

//! Runtime settings
//!
//! Settings come from an optional YAML file; environment variables (usually
//! loaded from `.env`) override individual values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::adk::error::StepflowError;

/// Local Ollama server speaking the OpenAI protocol
pub const DEFAULT_MODEL_BASE_URL: &str = "http://localhost:11434/v1";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    /// Model used for planning, query writing and reflection
    pub planner_model: String,
    /// Model used for summaries
    pub summary_model: String,
    pub brave_api_key: Option<String>,
    pub http_timeout_secs: u64,
    /// Where generated files are written
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_MODEL_BASE_URL.to_string(),
            planner_model: "qwen2.5:14b-instruct-q8_0".to_string(),
            summary_model: "exaone3.5:7.8b-instruct-fp16".to_string(),
            brave_api_key: None,
            http_timeout_secs: 30,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    /// Load settings from `path` (if given) and apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, StepflowError> {
        let settings = match path {
            Some(path) => Self::parse_yaml(&fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        settings.with_overrides(|key| std::env::var(key).ok())
    }

    /// Parse settings from a YAML string; missing keys keep their defaults
    pub fn parse_yaml(content: &str) -> Result<Self, StepflowError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply overrides from a variable lookup such as `std::env::var`
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, StepflowError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("OPENAI_API_KEY") {
            self.openai_api_key = Some(v);
        }
        if let Some(v) = lookup("OPENAI_BASE_URL") {
            self.openai_base_url = v;
        }
        if let Some(v) = lookup("STEPFLOW_PLANNER_MODEL") {
            self.planner_model = v;
        }
        if let Some(v) = lookup("STEPFLOW_SUMMARY_MODEL") {
            self.summary_model = v;
        }
        if let Some(v) = lookup("BRAVE_API_KEY") {
            self.brave_api_key = Some(v);
        }
        if let Some(v) = lookup("STEPFLOW_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = v.parse().map_err(|_| {
                StepflowError::config(format!("STEPFLOW_HTTP_TIMEOUT_SECS is not a number: {}", v))
            })?;
        }
        if let Some(v) = lookup("STEPFLOW_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        Ok(self)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn require_brave_api_key(&self) -> Result<&str, StepflowError> {
        self.brave_api_key
            .as_deref()
            .ok_or_else(|| StepflowError::config("BRAVE_API_KEY must be set"))
    }
}
