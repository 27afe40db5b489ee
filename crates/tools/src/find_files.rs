//! Find files tool — glob matching under a root directory.

use async_trait::async_trait;
use llamaloop_core::{ParamSpec, Tool, ToolError, ToolParams, ToolResult};

use crate::{opt_str, req_str};

/// Cap on reported matches.
const MAX_MATCHES: usize = 200;

pub struct FindFilesTool;

#[async_trait]
impl Tool for FindFilesTool {
    fn name(&self) -> &str {
        "find_files"
    }

    fn description(&self) -> &str {
        "Find files matching a glob pattern."
    }

    fn parameters(&self) -> ToolParams {
        ToolParams::new(vec![
            ParamSpec::string("pattern", "Glob pattern, e.g. '**/*.py' or 'src/*.ts'.")
                .required(),
            ParamSpec::string("root", "Root directory to search from (default '.').")
                .with_default(serde_json::json!(".")),
        ])
    }

    async fn execute(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ToolResult, ToolError> {
        let pattern = req_str(&arguments, "pattern")?;
        let root = opt_str(&arguments, "root").unwrap_or_else(|| ".".into());

        let full_pattern = if root == "." {
            pattern.clone()
        } else {
            format!("{}/{}", root.trim_end_matches('/'), pattern)
        };

        // glob is synchronous; matching runs on a blocking thread.
        let listing = tokio::task::spawn_blocking(move || -> Result<Vec<String>, String> {
            let paths = glob::glob(&full_pattern).map_err(|e| e.to_string())?;
            let mut matches: Vec<String> = paths
                .filter_map(|p| p.ok())
                .map(|p| p.display().to_string())
                .collect();
            matches.sort();
            matches.truncate(MAX_MATCHES);
            Ok(matches)
        })
        .await
        .map_err(|e| ToolError::ExecutionFailed {
            tool_name: "find_files".into(),
            reason: e.to_string(),
        })?;

        match listing {
            Ok(matches) if matches.is_empty() => Ok(ToolResult::ok(format!(
                "No files matched '{pattern}' under {root}"
            ))),
            Ok(matches) => Ok(ToolResult::ok(matches.join("\n"))),
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
    async fn matches_nested_glob() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/sub")).unwrap();
        std::fs::write(dir.path().join("src/a.rs"), "").unwrap();
        std::fs::write(dir.path().join("src/sub/b.rs"), "").unwrap();
        std::fs::write(dir.path().join("src/c.txt"), "").unwrap();

        let result = FindFilesTool
            .execute(args(serde_json::json!({
                "pattern": "**/*.rs",
                "root": dir.path().to_str().unwrap(),
            })))
            .await
            .unwrap();
        assert!(result.output.contains("a.rs"));
        assert!(result.output.contains("b.rs"));
        assert!(!result.output.contains("c.txt"));
    }

    #[tokio::test]
    async fn no_matches_message() {
        let dir = tempfile::tempdir().unwrap();
        let result = FindFilesTool
            .execute(args(serde_json::json!({
                "pattern": "*.zig",
                "root": dir.path().to_str().unwrap(),
            })))
            .await
            .unwrap();
        assert!(result.output.contains("No files matched"));
    }

    #[tokio::test]
    async fn invalid_pattern_reported_in_band() {
        let result = FindFilesTool
            .execute(args(serde_json::json!({"pattern": "a[unclosed"})))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.starts_with("[error]"));
    }
}
