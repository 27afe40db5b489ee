//! Shell tool — execute a command and capture its output.

use async_trait::async_trait;
use llamaloop_core::{ParamSpec, Tool, ToolError, ToolParams, ToolResult};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::{opt_str, req_str};

pub const DEFAULT_TIMEOUT_SECS: u64 = 90;

/// Run a shell command via `sh -c` with an optional working directory and
/// timeout. stdout and stderr are combined; a timeout is reported in-band
/// rather than surfaced as an error.
pub struct ShellTool;

/// Format captured output the way the model expects to read it:
/// stdout first, stderr under a `[stderr]` marker, exit code when nonzero.
pub(crate) fn render_output(stdout: &str, stderr: &str, code: Option<i32>) -> String {
    let mut output = String::new();
    if !stdout.is_empty() {
        output.push_str(stdout);
    }
    if !stderr.is_empty() {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str("[stderr]\n");
        output.push_str(stderr);
    }
    let code = code.unwrap_or(-1);
    if output.is_empty() {
        output = format!("(exit code {code}, no output)");
    } else if code != 0 {
        output.push_str(&format!("\n[exit code {code}]"));
    }
    output.trim_end().to_string()
}

/// Shared runner used by `shell` and `run_tests`.
pub(crate) async fn run_command(
    command: &str,
    cwd: Option<&str>,
    timeout_secs: u64,
) -> Result<ToolResult, ToolError> {
    debug!(command = %command, timeout_secs, "Executing shell command");

    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let output = tokio::time::timeout(std::time::Duration::from_secs(timeout_secs), cmd.output());
    match output.await {
        Err(_) => {
            warn!(command = %command, timeout_secs, "Command timed out");
            Ok(ToolResult::error(format!(
                "[error] Command timed out after {timeout_secs}s"
            )))
        }
        Ok(Err(e)) => Ok(ToolResult::error(format!("[error] {e}"))),
        Ok(Ok(output)) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            let rendered = render_output(&stdout, &stderr, output.status.code());
            Ok(ToolResult {
                success: output.status.success(),
                ..ToolResult::ok(rendered)
            })
        }
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Run a shell command and return its stdout/stderr. Use for file ops, git, \
         package managers, compiling, etc. Avoid long-running or interactive processes."
    }

    fn parameters(&self) -> ToolParams {
        ToolParams::new(vec![
            ParamSpec::string("command", "The shell command to execute.").required(),
            ParamSpec::string("cwd", "Working directory (optional, defaults to current dir)."),
            ParamSpec::integer("timeout", "Timeout in seconds (default 90).")
                .with_default(serde_json::json!(DEFAULT_TIMEOUT_SECS)),
        ])
    }

    async fn execute(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ToolResult, ToolError> {
        let command = req_str(&arguments, "command")?;
        let cwd = opt_str(&arguments, "cwd");
        let timeout = arguments
            .get("timeout")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        run_command(&command, cwd.as_deref(), timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(json: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        json.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn execute_echo() {
        let result = ShellTool
            .execute(args(serde_json::json!({"command": "echo hello"})))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "hello");
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported_in_band() {
        let result = ShellTool
            .execute(args(serde_json::json!({"command": "echo boom >&2; exit 3"})))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("[stderr]"));
        assert!(result.output.contains("boom"));
        assert!(result.output.contains("[exit code 3]"));
    }

    #[tokio::test]
    async fn silent_command_reports_exit_code() {
        let result = ShellTool
            .execute(args(serde_json::json!({"command": "true"})))
            .await
            .unwrap();
        assert_eq!(result.output, "(exit code 0, no output)");
    }

    #[tokio::test]
    async fn timeout_reported_in_band() {
        let result = ShellTool
            .execute(args(serde_json::json!({"command": "sleep 5", "timeout": 1})))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("timed out after 1s"));
    }

    #[tokio::test]
    async fn cwd_is_honored() {
        let dir = tempfile::tempdir().unwrap();
        let result = ShellTool
            .execute(args(serde_json::json!({
                "command": "pwd",
                "cwd": dir.path().to_str().unwrap(),
            })))
            .await
            .unwrap();
        assert!(result.output.contains(dir.path().file_name().unwrap().to_str().unwrap()));
    }

    #[tokio::test]
    async fn missing_command_is_invalid() {
        let result = ShellTool.execute(serde_json::Map::new()).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[test]
    fn render_combines_streams() {
        let out = render_output("ok", "warning", Some(0));
        assert_eq!(out, "ok\n[stderr]\nwarning");
    }
}
