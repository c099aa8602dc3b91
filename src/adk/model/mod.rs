// SPDX-License-Identifier: MIT

//! Model module - defines the LLM model trait and helpers
//!
//! Steps only talk to models through [`Model`]; [`generate_text`] and
//! [`generate_structured`] cover the two call shapes the workflows need.
//! - [openai] - OpenAI-compatible chat completions (OpenAI, Ollama `/v1`)

pub mod openai;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adk::error::ModelError;

/// Who authored a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// JSON schema the reply must conform to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: Value,
}

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<ResponseSchema>,
}

impl GenerationConfig {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            ..Self::default()
        }
    }
}

/// Core trait for LLM model implementations
#[async_trait]
pub trait Model: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<Message, ModelError>;
}

/// Send `messages` and return the reply text
pub async fn generate_text(
    model: &dyn Model,
    messages: &[Message],
    config: &GenerationConfig,
) -> Result<String, ModelError> {
    let reply = model.generate(messages, config).await?;
    Ok(reply.content)
}

/// Ask for a reply shaped like `T` and decode it
pub async fn generate_structured<T>(
    model: &dyn Model,
    messages: &[Message],
    config: &GenerationConfig,
) -> Result<T, ModelError>
where
    T: JsonSchema + DeserializeOwned,
{
    let mut config = config.clone();
    config.response_schema = Some(response_schema::<T>()?);

    let reply = model.generate(messages, &config).await?;
    parse_structured(&reply.content)
}

/// Build the response schema advertised for `T`
pub fn response_schema<T: JsonSchema>() -> Result<ResponseSchema, ModelError> {
    let schema = schemars::schema_for!(T);
    let name = schema
        .schema
        .metadata
        .as_ref()
        .and_then(|m| m.title.clone())
        .unwrap_or_else(|| "response".to_string());
    let schema =
        serde_json::to_value(&schema).map_err(|e| ModelError::InvalidResponse(e.to_string()))?;
    Ok(ResponseSchema { name, schema })
}

/// Decode a structured reply, tolerating a surrounding ```json fence
pub fn parse_structured<T: DeserializeOwned>(content: &str) -> Result<T, ModelError> {
    let body = strip_code_fence(content);
    serde_json::from_str(body).map_err(|e| {
        ModelError::InvalidResponse(format!("{} (reply was: {})", e, truncate(content, 200)))
    })
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
