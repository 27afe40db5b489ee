//! Read file tool — numbered file contents with an optional line range.

use async_trait::async_trait;
use llamaloop_core::{ParamSpec, Tool, ToolError, ToolParams, ToolResult};

use crate::req_str;

/// Files larger than this are refused; the model should use the range
/// parameters or grep instead.
const MAX_FILE_BYTES: u64 = 2_000_000;

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file. Returns the text content with line numbers."
    }

    fn parameters(&self) -> ToolParams {
        ToolParams::new(vec![
            ParamSpec::string("path", "Absolute or relative path to the file.").required(),
            ParamSpec::integer("start_line", "First line to read (1-indexed, optional)."),
            ParamSpec::integer("end_line", "Last line to read (1-indexed, optional)."),
        ])
    }

    async fn execute(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ToolResult, ToolError> {
        let path = req_str(&arguments, "path")?;
        let start_line = arguments.get("start_line").and_then(|v| v.as_u64());
        let end_line = arguments.get("end_line").and_then(|v| v.as_u64());

        let meta = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(_) => return Ok(ToolResult::error(format!("[error] File not found: {path}"))),
        };
        if meta.len() > MAX_FILE_BYTES {
            return Ok(ToolResult::error(
                "[error] File too large (>2MB). Use start_line/end_line or grep.",
            ));
        }

        let content = match tokio::fs::read(&path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => return Ok(ToolResult::error(format!("[error] {e}"))),
        };

        let lines: Vec<&str> = content.lines().collect();
        let (skip, first_number) = match start_line {
            Some(s) if s > 0 => (s as usize - 1, s as usize),
            _ => (0, 1),
        };
        let take = match end_line {
            Some(e) => (e as usize).saturating_sub(skip),
            None => lines.len().saturating_sub(skip),
        };

        let numbered: Vec<String> = lines
            .iter()
            .skip(skip)
            .take(take)
            .enumerate()
            .map(|(i, l)| format!("{:4}: {l}", first_number + i))
            .collect();

        if numbered.is_empty() {
            Ok(ToolResult::ok("(empty file)"))
        } else {
            Ok(ToolResult::ok(numbered.join("\n")))
        }
    }
}
