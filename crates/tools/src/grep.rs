//! Grep tool — regex search over a file or directory tree.

use async_trait::async_trait;
use llamaloop_core::{ParamSpec, Tool, ToolError, ToolParams, ToolResult};
use regex::RegexBuilder;
use std::path::Path;
use walkdir::WalkDir;

use crate::{opt_str, req_str};

/// Cap on reported matches.
const MAX_MATCHES: usize = 300;

pub struct GrepTool;

fn search(
    pattern: &str,
    path: &str,
    file_glob: Option<&str>,
    case_insensitive: bool,
    context_lines: usize,
) -> Result<String, String> {
    let rx = RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| format!("Invalid regex: {e}"))?;

    let glob_matcher = match file_glob {
        Some(g) => Some(glob::Pattern::new(g).map_err(|e| format!("Invalid glob: {e}"))?),
        None => None,
    };

    let target = Path::new(path);
    let files: Vec<std::path::PathBuf> = if target.is_file() {
        vec![target.to_path_buf()]
    } else {
        WalkDir::new(target)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| match &glob_matcher {
                Some(g) => e
                    .path()
                    .file_name()
                    .map(|n| g.matches(&n.to_string_lossy()))
                    .unwrap_or(false),
                None => true,
            })
            .map(|e| e.into_path())
            .collect()
    };

    let mut results = Vec::new();
    let mut match_count = 0usize;

    for fp in files {
        let Ok(bytes) = std::fs::read(&fp) else {
            continue;
        };
        let text = String::from_utf8_lossy(&bytes);
        let lines: Vec<&str> = text.lines().collect();
        for (i, line) in lines.iter().enumerate() {
            if !rx.is_match(line) {
                continue;
            }
            match_count += 1;
            if match_count > MAX_MATCHES {
                results.push(format!("... (truncated, >{MAX_MATCHES} matches)"));
                return Ok(results.join("\n"));
            }
            let ctx_start = i.saturating_sub(context_lines);
            let ctx_end = (i + context_lines + 1).min(lines.len());
            let mut block = Vec::new();
            for (j, ctx_line) in lines.iter().enumerate().take(ctx_end).skip(ctx_start) {
                let marker = if j == i { ">" } else { " " };
                block.push(format!("{}:{}{marker} {ctx_line}", fp.display(), j + 1));
            }
            results.push(block.join("\n"));
        }
    }

    if results.is_empty() {
        Ok(format!("No matches for '{pattern}'"))
    } else {
        Ok(results.join("\n"))
    }
}

#[async_trait]
impl Tool for GrepTool {
    fn name(&self) -> &str {
        "grep"
    }

    fn description(&self) -> &str {
        "Search for a regex pattern inside files."
    }

    fn parameters(&self) -> ToolParams {
        ToolParams::new(vec![
            ParamSpec::string("pattern", "Regex pattern to search for.").required(),
            ParamSpec::string("path", "File or directory to search in (default '.').")
                .with_default(serde_json::json!(".")),
            ParamSpec::string("glob", "File glob filter, e.g. '*.py' (optional)."),
            ParamSpec::boolean("case_insensitive", "Case-insensitive matching (default false).")
                .with_default(serde_json::json!(false)),
            ParamSpec::integer("context_lines", "Lines of context around each match (default 0).")
                .with_default(serde_json::json!(0)),
        ])
    }

    async fn execute(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ToolResult, ToolError> {
        let pattern = req_str(&arguments, "pattern")?;
        let path = opt_str(&arguments, "path").unwrap_or_else(|| ".".into());
        let file_glob = opt_str(&arguments, "glob");
        let case_insensitive = arguments
            .get("case_insensitive")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let context_lines = arguments
            .get("context_lines")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;

        let output = tokio::task::spawn_blocking(move || {
            search(
                &pattern,
                &path,
                file_glob.as_deref(),
                case_insensitive,
                context_lines,
            )
        })
        .await
        .map_err(|e| ToolError::ExecutionFailed {
            tool_name: "grep".into(),
            reason: e.to_string(),
        })?;

        match output {
            Ok(text) => Ok(ToolResult::ok(text)),
            Err(e) => Ok(ToolResult::error(format!("[error] {e}"))),
        }
    }
}
