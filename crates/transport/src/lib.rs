//! Ollama transport — streaming chat completions over NDJSON.
//!
//! Talks to an Ollama-compatible server:
//! - `POST /api/chat` with `stream: true` — the response body is
//!   newline-delimited JSON, one chunk per line, the last carrying
//!   `done: true` and optionally a `done_reason`.
//! - `GET /api/tags` — lists locally available models.
//!
//! Token deltas are forwarded as they arrive. Native tool calls are
//! accumulated silently and reported only on the terminal [`ChatEvent::Done`]
//! — and once a tool call has been seen, further token deltas are suppressed
//! (native tool calls win over any accompanying text). A malformed line is
//! skipped, not fatal.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use llamaloop_core::{
    ChatEvent, ChatRequest, ChatTransport, EventReceiver, Message, Role, ToolCall, ToolDefinition,
    TransportError,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// A transport speaking the Ollama chat API.
pub struct OllamaTransport {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaTransport {
    /// Create a transport against the given base URL.
    ///
    /// No overall request timeout: generation on slow hardware can
    /// legitimately take minutes, so only connect errors fail fast.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::System => "system".into(),
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::Tool => "tool".into(),
                },
                content: m.content.clone(),
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .iter()
                            .map(|tc| ApiToolCall {
                                function: ApiFunction {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                },
                            })
                            .collect(),
                    )
                },
            })
            .collect()
    }

    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }
}

#[async_trait]
impl ChatTransport for OllamaTransport {
    async fn stream_chat(&self, request: ChatRequest) -> Result<EventReceiver, TransportError> {
        let url = format!("{}/api/chat", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "stream": true,
        });
        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        debug!(model = %request.model, messages = request.messages.len(), "Opening chat stream");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Connection {
                url: self.base_url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let message = response.text().await.unwrap_or_default();
            warn!(status, body = %message, "Chat request rejected");
            return Err(TransportError::Api { status, message });
        }

        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();
            let mut content = String::new();
            let mut tool_calls: Vec<ToolCall> = Vec::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(TransportError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                // Process complete lines; a partial line stays buffered.
                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim().to_string();
                    buffer = buffer[line_end + 1..].to_string();
                    if line.is_empty() {
                        continue;
                    }

                    let chunk: StreamChunk = match serde_json::from_str(&line) {
                        Ok(c) => c,
                        Err(e) => {
                            trace!(line = %line, error = %e, "Skipping unparseable stream line");
                            continue;
                        }
                    };

                    if let Some(msg) = &chunk.message {
                        if let Some(calls) = &msg.tool_calls {
                            for tc in calls {
                                tool_calls.push(ToolCall {
                                    id: format!("call_{}", uuid::Uuid::new_v4().simple()),
                                    name: tc.function.name.clone(),
                                    arguments: tc.function.arguments.clone(),
                                });
                            }
                        }
                        if !msg.content.is_empty() {
                            content.push_str(&msg.content);
                            // Native tool calls win: once one is seen, the
                            // accompanying text is carrier only.
                            if tool_calls.is_empty()
                                && tx
                                    .send(Ok(ChatEvent::Token(msg.content.clone())))
                                    .await
                                    .is_err()
                            {
                                return; // receiver dropped
                            }
                        }
                    }

                    if chunk.done {
                        let _ = tx
                            .send(Ok(ChatEvent::Done {
                                content,
                                tool_calls,
                                stop_reason: chunk.done_reason,
                            }))
                            .await;
                        return;
                    }
                }
            }

            // Stream ended without a done chunk — still deliver what we have.
            let _ = tx
                .send(Ok(ChatEvent::Done {
                    content,
                    tool_calls,
                    stop_reason: None,
                }))
                .await;
        });

        Ok(rx)
    }

    async fn list_models(&self) -> Result<Vec<String>, TransportError> {
        let url = format!("{}/api/tags", self.base_url);
        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|e| TransportError::Connection {
                    url: self.base_url.clone(),
                    reason: e.to_string(),
                })?;

        let status = response.status().as_u16();
        if status != 200 {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::Api { status, message });
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

// --- Ollama wire types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
}

/// Ollama's native tool-call shape: arguments arrive as a JSON object.
#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// One line of the `/api/chat` streaming response.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let transport = OllamaTransport::new("http://localhost:11434/");
        assert_eq!(transport.base_url(), "http://localhost:11434");
    }

    #[test]
    fn parse_content_delta_chunk() {
        let line = r#"{"model":"qwen2.5:7b","message":{"role":"assistant","content":"Hel"},"done":false}"#;
        let chunk: StreamChunk = serde_json::from_str(line).unwrap();
        assert_eq!(chunk.message.unwrap().content, "Hel");
        assert!(!chunk.done);
    }

    #[test]
    fn parse_done_chunk() {
        let line = r#"{"model":"qwen2.5:7b","message":{"role":"assistant","content":""},"done":true,"done_reason":"stop"}"#;
        let chunk: StreamChunk = serde_json::from_str(line).unwrap();
        assert!(chunk.done);
        assert_eq!(chunk.done_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn parse_native_tool_call_chunk() {
        let line = r#"{"message":{"role":"assistant","content":"","tool_calls":[{"function":{"name":"shell","arguments":{"command":"ls"}}}]},"done":false}"#;
        let chunk: StreamChunk = serde_json::from_str(line).unwrap();
        let msg = chunk.message.unwrap();
        let calls = msg.tool_calls.unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.name, "shell");
        assert_eq!(calls[0].function.arguments["command"], "ls");
    }

    #[test]
    fn malformed_line_does_not_parse() {
        assert!(serde_json::from_str::<StreamChunk>("{not json").is_err());
    }

    #[test]
    fn parse_tags_response() {
        let body = r#"{"models":[{"name":"qwen2.5:7b","size":4}, {"name":"llama3.2:latest"}]}"#;
        let tags: TagsResponse = serde_json::from_str(body).unwrap();
        let names: Vec<_> = tags.models.into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["qwen2.5:7b", "llama3.2:latest"]);
    }

    #[test]
    fn parse_empty_tags_response() {
        let tags: TagsResponse = serde_json::from_str(r#"{"models":[]}"#).unwrap();
        assert!(tags.models.is_empty());
    }

    #[test]
    fn tool_role_message_serialization() {
        let msgs = OllamaTransport::to_api_messages(&[Message::tool_result("call_1", "output")]);
        assert_eq!(msgs[0].role, "tool");
        assert_eq!(msgs[0].content, "output");
    }

    #[test]
    fn assistant_message_carries_tool_calls() {
        let msg = Message::assistant_with_calls(
            "",
            vec![ToolCall {
                id: "call_1".into(),
                name: "grep".into(),
                arguments: serde_json::json!({"pattern": "fn main"}),
            }],
        );
        let api = OllamaTransport::to_api_messages(&[msg]);
        let calls = api[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "grep");
    }

    #[test]
    fn tool_definitions_wrapped_as_functions() {
        let defs = vec![ToolDefinition {
            name: "shell".into(),
            description: "Run a command".into(),
            parameters: serde_json::json!({"type": "object"}),
        }];
        let api = OllamaTransport::to_api_tools(&defs);
        assert_eq!(api[0].r#type, "function");
        assert_eq!(api[0].function.name, "shell");
    }
}
