//! Write file tool — write or append, creating parent directories.

use async_trait::async_trait;
use llamaloop_core::{ParamSpec, Tool, ToolError, ToolParams, ToolResult};

use crate::req_str;

pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write or overwrite a file with given content."
    }

    fn parameters(&self) -> ToolParams {
        ToolParams::new(vec![
            ParamSpec::string("path", "Path to the file to write.").required(),
            ParamSpec::string("content", "Content to write into the file.").required(),
            ParamSpec::boolean("append", "If true, append instead of overwrite (default false).")
                .with_default(serde_json::json!(false)),
        ])
    }

    async fn execute(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ToolResult, ToolError> {
        let path = req_str(&arguments, "path")?;
        let content = req_str(&arguments, "content")?;
        let append = arguments
            .get("append")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if let Some(parent) = std::path::Path::new(&path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    return Ok(ToolResult::error(format!("[error] {e}")));
                }
            }
        }

        let write_result = if append {
            let existing = tokio::fs::read(&path).await.unwrap_or_default();
            let mut combined = existing;
            combined.extend_from_slice(content.as_bytes());
            tokio::fs::write(&path, combined).await
        } else {
            tokio::fs::write(&path, &content).await
        };

        match write_result {
            Ok(()) => {
                let action = if append { "Appended" } else { "Written" };
                Ok(ToolResult::ok(format!(
                    "{action} {} chars to {path}",
                    content.chars().count()
                )))
            }
            Err(e) => Ok(ToolResult::error(format!("[error] {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(json: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        json.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn writes_new_file_creating_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deep/out.txt");

        let result = WriteFileTool
            .execute(args(serde_json::json!({
                "path": path.to_str().unwrap(),
                "content": "hello",
            })))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("Written 5 chars"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }

    #[tokio::test]
    async fn append_preserves_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        std::fs::write(&path, "first\n").unwrap();

        let result = WriteFileTool
            .execute(args(serde_json::json!({
                "path": path.to_str().unwrap(),
                "content": "second\n",
                "append": true,
            })))
            .await
            .unwrap();
        assert!(result.output.contains("Appended"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[tokio::test]
    async fn overwrite_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, "old").unwrap();

        WriteFileTool
            .execute(args(serde_json::json!({
                "path": path.to_str().unwrap(),
                "content": "new",
            })))
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }
}
