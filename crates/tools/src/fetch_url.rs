//! Fetch URL tool — HTTP GET with a body cap for model consumption.

use async_trait::async_trait;
use llamaloop_core::{ParamSpec, Tool, ToolError, ToolParams, ToolResult};
use tracing::debug;

use crate::req_str;

/// Cap on the body fed back to the model. Larger than the interactive
/// display cap: fetched pages are the one place where the model genuinely
/// needs more context than a panel can show.
pub const FETCH_BODY_CAP: usize = 20_000;

const TIMEOUT_SECS: u64 = 15;

pub struct FetchUrlTool {
    client: reqwest::Client,
}

impl FetchUrlTool {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Render a fetched body: status line header, then the body capped at
    /// [`FETCH_BODY_CAP`] characters.
    pub(crate) fn render(status: u16, content_type: &str, body: &str) -> ToolResult {
        let header = format!("[HTTP {status}] {content_type}\n\n");
        let body_result = ToolResult::ok(body).truncate_to(FETCH_BODY_CAP);
        ToolResult {
            output: format!("{header}{}", body_result.output),
            success: status < 400,
            truncated: body_result.truncated,
            total_len: body_result.total_len,
        }
    }
}

impl Default for FetchUrlTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FetchUrlTool {
    fn name(&self) -> &str {
        "fetch_url"
    }

    fn description(&self) -> &str {
        "Fetch the content of a URL (HTTP GET). Returns text response."
    }

    fn parameters(&self) -> ToolParams {
        ToolParams::new(vec![
            ParamSpec::string("url", "URL to fetch.").required(),
            ParamSpec::object("headers", "Optional HTTP headers as key-value pairs."),
        ])
    }

    async fn execute(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ToolResult, ToolError> {
        let url = req_str(&arguments, "url")?;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ToolError::InvalidArguments(
                "URL must start with http:// or https://".into(),
            ));
        }

        debug!(url = %url, "Fetching URL");

        let mut request = self.client.get(&url);
        if let Some(headers) = arguments.get("headers").and_then(|v| v.as_object()) {
            for (k, v) in headers {
                if let Some(value) = v.as_str() {
                    request = request.header(k, value);
                }
            }
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => return Ok(ToolResult::error(format!("[error] {e}"))),
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = match response.text().await {
            Ok(t) => t,
            Err(e) => return Ok(ToolResult::error(format!("[error] {e}"))),
        };

        Ok(Self::render(status, &content_type, &body))
    }
}
