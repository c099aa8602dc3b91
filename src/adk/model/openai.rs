// SPDX-License-Identifier: MIT

//! OpenAI Model - chat completions API implementation
//!
//! Any endpoint speaking the OpenAI chat completions protocol works here,
//! including a local Ollama server at `http://localhost:11434/v1`.

use super::{GenerationConfig, Message, Model, Role};
use crate::adk::error::ModelError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible chat model
pub struct OpenAIModel {
    client: Client,
    api_key: Option<String>,
    model_name: String,
    base_url: String,
}

impl OpenAIModel {
    pub fn new(
        model_name: impl Into<String>,
        api_key: Option<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ModelError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            model_name: model_name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a model from `OPENAI_API_KEY` / `OPENAI_BASE_URL`.
    ///
    /// The key is required only when talking to the public OpenAI endpoint.
    pub fn from_env(model_name: impl Into<String>) -> Result<Self, ModelError> {
        let api_key = env::var("OPENAI_API_KEY").ok();
        let base_url = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        if api_key.is_none() && base_url == DEFAULT_BASE_URL {
            return Err(ModelError::ApiKeyMissing("openai".to_string()));
        }
        Self::new(model_name, api_key, base_url, Duration::from_secs(120))
    }

    fn to_openai_message(message: &Message) -> Value {
        let role = match message.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        json!({ "role": role, "content": message.content })
    }

    fn request_body(&self, messages: &[Message], config: &GenerationConfig) -> Value {
        let messages: Vec<Value> = messages.iter().map(Self::to_openai_message).collect();
        let mut body = json!({
            "model": self.model_name,
            "messages": messages
        });

        if let Some(temp) = config.temperature {
            body["temperature"] = json!(temp);
        }
        if let Some(max_tokens) = config.max_output_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(top_p) = config.top_p {
            body["top_p"] = json!(top_p);
        }
        if let Some(schema) = &config.response_schema {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "schema": schema.schema
                }
            });
        }
        body
    }

    fn parse_openai_response(response: &Value) -> Result<Message, ModelError> {
        let choice = response["choices"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| ModelError::InvalidResponse("No choices in OpenAI response".into()))?;

        let content = choice["message"]["content"]
            .as_str()
            .ok_or_else(|| ModelError::InvalidResponse("Choice has no text content".into()))?;

        Ok(Message::assistant(content))
    }
}

#[async_trait]
impl Model for OpenAIModel {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn generate(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<Message, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(messages, config);

        log::debug!(
            "OpenAI request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let resp = request.send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await?;
            return Err(ModelError::Invocation(format!(
                "OpenAI API error ({}): {}",
                status, text
            )));
        }

        let resp_json: Value = resp.json().await?;
        log::debug!("OpenAI response: {}", resp_json);

        Self::parse_openai_response(&resp_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::model::ResponseSchema;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn model(base_url: &str) -> OpenAIModel {
        OpenAIModel::new(
            "qwen2.5:14b",
            Some("sk-test".to_string()),
            base_url,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_message_conversion() {
        let msg = OpenAIModel::to_openai_message(&Message::assistant("I can help"));
        assert_eq!(msg["role"], "assistant");
        assert_eq!(msg["content"], "I can help");

        let msg = OpenAIModel::to_openai_message(&Message::system("You are helpful"));
        assert_eq!(msg["role"], "system");
    }

    #[test]
    fn test_request_body_with_schema() {
        let config = GenerationConfig {
            temperature: Some(0.1),
            response_schema: Some(ResponseSchema {
                name: "ApiPlan".to_string(),
                schema: json!({"type": "object"}),
            }),
            ..GenerationConfig::default()
        };
        let body = model("http://localhost").request_body(&[Message::user("hi")], &config);

        assert_eq!(body["model"], "qwen2.5:14b");
        assert_eq!(body["messages"][0]["content"], "hi");
        assert_eq!(body["response_format"]["json_schema"]["name"], "ApiPlan");
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_parse_openai_text_response() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Hello, how can I help?"
                }
            }]
        });
        let message = OpenAIModel::parse_openai_response(&response).unwrap();
        assert_eq!(message, Message::assistant("Hello, how can I help?"));
    }

    #[test]
    fn test_parse_response_without_choices() {
        let err = OpenAIModel::parse_openai_response(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_generate_against_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "pong"}}]
            })))
            .mount(&server)
            .await;

        let reply = model(&format!("{}/v1", server.uri()))
            .generate(&[Message::user("ping")], &GenerationConfig::default())
            .await
            .unwrap();
        assert_eq!(reply.content, "pong");
    }

    #[tokio::test]
    async fn test_error_status_is_invocation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = model(&server.uri())
            .generate(&[Message::user("ping")], &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("overloaded"));
    }
}
