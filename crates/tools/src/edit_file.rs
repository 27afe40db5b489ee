//! Edit file tool — targeted old-text → new-text replacement.

use async_trait::async_trait;
use llamaloop_core::{ParamSpec, Tool, ToolError, ToolParams, ToolResult};

use crate::req_str;

pub struct EditFileTool;

#[async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn description(&self) -> &str {
        "Edit an existing file by replacing a specific block of text. Provide old_text \
         (exact match, including whitespace/indentation) and new_text to substitute. \
         Use this for targeted changes without rewriting the whole file. Fails if \
         old_text is not found."
    }

    fn parameters(&self) -> ToolParams {
        ToolParams::new(vec![
            ParamSpec::string("path", "Path to the file to edit.").required(),
            ParamSpec::string("old_text", "Exact text to find (must exist in the file).")
                .required(),
            ParamSpec::string("new_text", "Replacement text.").required(),
            ParamSpec::boolean(
                "replace_all",
                "Replace every occurrence instead of only the first (default false).",
            )
            .with_default(serde_json::json!(false)),
        ])
    }

    async fn execute(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ToolResult, ToolError> {
        let path = req_str(&arguments, "path")?;
        let old_text = req_str(&arguments, "old_text")?;
        let new_text = req_str(&arguments, "new_text")?;
        let replace_all = arguments
            .get("replace_all")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let content = match tokio::fs::read(&path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => return Ok(ToolResult::error(format!("[error] File not found: {path}"))),
        };

        if !content.contains(&old_text) {
            return Ok(ToolResult::error(format!(
                "[error] old_text not found in {path}"
            )));
        }

        let (new_content, count) = if replace_all {
            let count = content.matches(&old_text).count();
            (content.replace(&old_text, &new_text), count)
        } else {
            (content.replacen(&old_text, &new_text, 1), 1)
        };

        match tokio::fs::write(&path, new_content).await {
            Ok(()) => Ok(ToolResult::ok(format!(
                "Replaced {count} occurrence(s) in {path}"
            ))),
            Err(e) => Ok(ToolResult::error(format!("[error] {e}"))),
        }
    }
}
