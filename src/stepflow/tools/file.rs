// SPDX-License-Identifier: MIT

use crate::adk::error::StepflowError;
use crate::adk::tool::{required_str, Tool};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use uuid::Uuid;

static WRITE_FILE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "text": {
                "type": "string",
                "description": "Text to write to file"
            }
        },
        "required": ["text"]
    })
});

/// Writes text to a fresh `<uuid>.md` file in the output directory
pub struct WriteFileTool {
    output_dir: PathBuf,
}

impl WriteFileTool {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `text` and return the new file's path
    pub async fn write(&self, text: &str) -> Result<PathBuf, StepflowError> {
        let path = self.output_dir.join(format!("{}.md", Uuid::new_v4()));
        tokio::fs::write(&path, text).await?;
        Ok(path)
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Basic write file tool. If you want to write text to a file, you can use this tool."
    }

    fn schema(&self) -> &Value {
        &WRITE_FILE_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<Value, StepflowError> {
        let text = required_str(&input, "text")?;
        let message = match self.write(text).await {
            Ok(path) => format!("File written successfully to {}.", path.display()),
            Err(e) => {
                log::warn!("Writing file in {} failed: {}", self.output_dir.display(), e);
                format!(
                    "Sorry, I couldn't write to file in {} cause by: {}",
                    self.output_dir.display(),
                    e
                )
            }
        };
        Ok(Value::String(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_markdown_file() {
        let dir = tempfile::tempdir().unwrap();
        let tool = WriteFileTool::new(dir.path());

        let path = tool.write("# Summary").await.unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("md"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Summary");
    }

    #[tokio::test]
    async fn test_execute_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let tool = WriteFileTool::new(dir.path());

        let value = tool.execute(json!({"text": "hello"})).await.unwrap();
        let message = value.as_str().unwrap();
        assert!(message.starts_with("File written successfully to "));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_reported_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let tool = WriteFileTool::new(dir.path().join("missing"));

        let value = tool.execute(json!({"text": "hello"})).await.unwrap();
        assert!(value.as_str().unwrap().starts_with("Sorry, I couldn't write"));
    }
}
