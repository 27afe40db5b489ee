//! Python eval tool — run a snippet through the system interpreter.

use async_trait::async_trait;
use llamaloop_core::{ParamSpec, Tool, ToolError, ToolParams, ToolResult};
use tokio::process::Command;
use tracing::debug;

use crate::req_str;

const TIMEOUT_SECS: u64 = 60;

pub struct PythonEvalTool;

#[async_trait]
impl Tool for PythonEvalTool {
    fn name(&self) -> &str {
        "python_eval"
    }

    fn description(&self) -> &str {
        "Execute Python code and return the output. Useful for calculations, data \
         processing, and quick scripts. Use print() to produce output."
    }

    fn parameters(&self) -> ToolParams {
        ToolParams::new(vec![
            ParamSpec::string("code", "Python code to execute.").required(),
        ])
    }

    async fn execute(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ToolResult, ToolError> {
        let code = req_str(&arguments, "code")?;
        debug!(bytes = code.len(), "Evaluating python snippet");

        let output = tokio::time::timeout(
            std::time::Duration::from_secs(TIMEOUT_SECS),
            Command::new("python3").arg("-c").arg(&code).output(),
        )
        .await;

        match output {
            Err(_) => Ok(ToolResult::error(format!(
                "[error] Code timed out after {TIMEOUT_SECS}s"
            ))),
            Ok(Err(e)) => Ok(ToolResult::error(format!("[error] {e}"))),
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let success = output.status.success();
                let mut combined = String::new();
                combined.push_str(&stdout);
                combined.push_str(&stderr);
                let combined = combined.trim_end();
                if combined.is_empty() {
                    Ok(ToolResult::ok("(no output)"))
                } else {
                    Ok(ToolResult {
                        success,
                        ..ToolResult::ok(combined)
                    })
                }
            }
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
    async fn prints_output() {
        let result = PythonEvalTool
            .execute(args(serde_json::json!({"code": "print(2 + 3)"})))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "5");
    }

    #[tokio::test]
    async fn silent_code_reports_no_output() {
        let result = PythonEvalTool
            .execute(args(serde_json::json!({"code": "x = 1"})))
            .await
            .unwrap();
        assert_eq!(result.output, "(no output)");
    }

    #[tokio::test]
    async fn exception_traceback_is_observable() {
        let result = PythonEvalTool
            .execute(args(serde_json::json!({"code": "raise ValueError('boom')"})))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("ValueError"));
        assert!(result.output.contains("boom"));
    }
}
