//! List directory tool — sorted entries with type markers and sizes.

use async_trait::async_trait;
use llamaloop_core::{ParamSpec, Tool, ToolError, ToolParams, ToolResult};
use std::path::Path;

use crate::opt_str;

pub struct ListDirTool;

fn human_size(size: u64) -> String {
    if size < 1024 {
        format!("{size} B")
    } else if size < 1_048_576 {
        format!("{:.1} KB", size as f64 / 1024.0)
    } else {
        format!("{:.1} MB", size as f64 / 1_048_576.0)
    }
}

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &str {
        "list_dir"
    }

    fn description(&self) -> &str {
        "List files and directories at a given path."
    }

    fn parameters(&self) -> ToolParams {
        ToolParams::new(vec![
            ParamSpec::string("path", "Directory path to list (default '.').")
                .with_default(serde_json::json!(".")),
            ParamSpec::boolean("show_hidden", "Include hidden files (default false).")
                .with_default(serde_json::json!(false)),
        ])
    }

    async fn execute(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ToolResult, ToolError> {
        let path = opt_str(&arguments, "path").unwrap_or_else(|| ".".into());
        let show_hidden = arguments
            .get("show_hidden")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let dir = Path::new(&path);
        if !dir.exists() {
            return Ok(ToolResult::error(format!("[error] Path not found: {path}")));
        }

        let mut entries = Vec::new();
        let mut reader = match tokio::fs::read_dir(dir).await {
            Ok(r) => r,
            Err(e) => return Ok(ToolResult::error(format!("[error] {e}"))),
        };
        while let Ok(Some(entry)) = reader.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !show_hidden && name.starts_with('.') {
                continue;
            }
            let file_type = entry.file_type().await.ok();
            let is_dir = file_type.as_ref().is_some_and(|t| t.is_dir());
            let is_symlink = file_type.as_ref().is_some_and(|t| t.is_symlink());
            let size = entry.metadata().await.map(|m| m.len()).unwrap_or(0);
            entries.push((is_dir, is_symlink, name, size));
        }

        // Directories first, then files, each alphabetically.
        entries.sort_by(|a, b| (!a.0, a.2.to_lowercase()).cmp(&(!b.0, b.2.to_lowercase())));

        if entries.is_empty() {
            return Ok(ToolResult::ok("(empty directory)"));
        }

        let lines: Vec<String> = entries
            .into_iter()
            .map(|(is_dir, is_symlink, name, size)| {
                if is_dir {
                    format!("[DIR]  {name}/")
                } else if is_symlink {
                    format!("[LNK]  {name}")
                } else {
                    format!("[FILE] {name}  ({})", human_size(size))
                }
            })
            .collect();

        Ok(ToolResult::ok(lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(json: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        json.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn lists_dirs_before_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("zdir")).unwrap();

        let result = ListDirTool
            .execute(args(serde_json::json!({"path": dir.path().to_str().unwrap()})))
            .await
            .unwrap();
        let dir_pos = result.output.find("[DIR]  zdir/").unwrap();
        let file_pos = result.output.find("[FILE] a.txt").unwrap();
        assert!(dir_pos < file_pos);
    }

    #[tokio::test]
    async fn hidden_files_skipped_by_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".hidden"), "x").unwrap();
        std::fs::write(dir.path().join("shown"), "x").unwrap();

        let result = ListDirTool
            .execute(args(serde_json::json!({"path": dir.path().to_str().unwrap()})))
            .await
            .unwrap();
        assert!(!result.output.contains(".hidden"));

        let result = ListDirTool
            .execute(args(serde_json::json!({
                "path": dir.path().to_str().unwrap(),
                "show_hidden": true,
            })))
            .await
            .unwrap();
        assert!(result.output.contains(".hidden"));
    }

    #[tokio::test]
    async fn empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = ListDirTool
            .execute(args(serde_json::json!({"path": dir.path().to_str().unwrap()})))
            .await
            .unwrap();
        assert_eq!(result.output, "(empty directory)");
    }

    #[test]
    fn human_sizes() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(3_145_728), "3.0 MB");
    }
}
