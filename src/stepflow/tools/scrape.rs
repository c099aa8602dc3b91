// SPDX-License-Identifier: MIT

use crate::adk::error::StepflowError;
use crate::adk::tool::{required_str, Tool};
use async_trait::async_trait;
use htmd::HtmlToMarkdown;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

static WEB_SCRAPE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "url": {
                "type": "string",
                "description": "URL to scrape text from"
            }
        },
        "required": ["url"]
    })
});

/// Fetches a page and returns its text on a single line.
///
/// Fetch failures are returned as text so a model can read them.
pub struct WebScrapeTool {
    client: Client,
    converter: HtmlToMarkdown,
}

impl WebScrapeTool {
    pub fn new(timeout: Duration) -> Result<Self, StepflowError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            converter: HtmlToMarkdown::builder()
                .skip_tags(vec!["script", "style", "nav", "footer"])
                .build(),
        })
    }

    /// Fetch `url` and return the flattened text
    pub async fn scrape(&self, url: &str) -> Result<String, StepflowError> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(StepflowError::api(url, format!("status {}", resp.status())));
        }
        let html = resp.text().await?;
        let text = self
            .converter
            .convert(&html)
            .map_err(|e| StepflowError::other(e.to_string()))?;
        Ok(flatten(&text))
    }
}

fn flatten(text: &str) -> String {
    text.trim().replace('\n', "\t")
}

#[async_trait]
impl Tool for WebScrapeTool {
    fn name(&self) -> &str {
        "web_scrape"
    }

    fn description(&self) -> &str {
        "Basic web scrape tool. If you want to scrape text from a URL, you can use this tool."
    }

    fn schema(&self) -> &Value {
        &WEB_SCRAPE_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<Value, StepflowError> {
        let url = required_str(&input, "url")?;
        let text = match self.scrape(url).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Scraping {} failed: {}", url, e);
                format!("Sorry, I couldn't fetch the data from url({}) cause by: {}", url, e)
            }
        };
        Ok(Value::String(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_flatten_replaces_newlines() {
        assert_eq!(flatten("\n# Title\nbody\n"), "# Title\tbody");
    }

    #[tokio::test]
    async fn test_scrape_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/post"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><head><script>var x = 1;</script></head><body><h1>Hello</h1><p>World</p></body></html>",
            ))
            .mount(&server)
            .await;

        let tool = WebScrapeTool::new(Duration::from_secs(5)).unwrap();
        let value = tool
            .execute(json!({"url": format!("{}/post", server.uri())}))
            .await
            .unwrap();
        let text = value.as_str().unwrap();
        assert!(text.contains("Hello"));
        assert!(text.contains("World"));
        assert!(!text.contains('\n'));
        assert!(!text.contains("var x"));
    }

    #[tokio::test]
    async fn test_failure_is_returned_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tool = WebScrapeTool::new(Duration::from_secs(5)).unwrap();
        let value = tool
            .execute(json!({"url": format!("{}/gone", server.uri())}))
            .await
            .unwrap();
        assert!(value.as_str().unwrap().starts_with("Sorry, I couldn't fetch"));
    }

    #[tokio::test]
    async fn test_missing_url_is_an_error() {
        let tool = WebScrapeTool::new(Duration::from_secs(1)).unwrap();
        assert!(tool.execute(json!({})).await.is_err());
    }
}
