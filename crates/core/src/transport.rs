//! Transport contract — the abstraction over the inference server.
//!
//! A `ChatTransport` knows how to open one streaming chat completion and
//! deliver it as a finite, non-restartable sequence of `ChatEvent`s. Token
//! deltas arrive incrementally; tool-call data rides only on the terminal
//! `Done` event, never interleaved — callers buffer text and learn about
//! tool calls once the stream ends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::message::Message;
use crate::tool::{ToolCall, ToolDefinition};

/// One streaming chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The model to use (e.g., "qwen2.5:7b").
    pub model: String,

    /// The conversation history, oldest first.
    pub messages: Vec<Message>,

    /// Tool schemas offered to the model; empty when tools are disabled.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// An event in a streaming chat completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatEvent {
    /// An incremental piece of assistant text.
    Token(String),

    /// The terminal event: full buffered text, any native tool calls, and
    /// the server's stop reason. Exactly one per successful stream.
    Done {
        content: String,
        tool_calls: Vec<ToolCall>,
        stop_reason: Option<String>,
    },
}

/// The receiving end of one in-flight completion.
pub type EventReceiver = mpsc::Receiver<std::result::Result<ChatEvent, TransportError>>;

/// The core transport trait.
///
/// The agent loop calls `stream_chat` without knowing which server is behind
/// it; tests substitute scripted implementations.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Open a streaming completion. The receiver yields zero or more
    /// `Token` events followed by exactly one `Done`, unless the stream
    /// fails mid-flight.
    async fn stream_chat(
        &self,
        request: ChatRequest,
    ) -> std::result::Result<EventReceiver, TransportError>;

    /// List the model identifiers the server offers. A well-formed response
    /// with no models is an empty vec, not an error.
    async fn list_models(&self) -> std::result::Result<Vec<String>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_skips_empty_tools() {
        let req = ChatRequest {
            model: "qwen2.5:7b".into(),
            messages: vec![Message::user("hi")],
            tools: vec![],
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("tools"));
    }

    #[test]
    fn done_event_roundtrip() {
        let event = ChatEvent::Done {
            content: "thinking".into(),
            tool_calls: vec![ToolCall {
                id: "call_1".into(),
                name: "shell".into(),
                arguments: serde_json::json!({"command": "ls"}),
            }],
            stop_reason: Some("stop".into()),
        };
        let json = serde_json::to_string(&event).unwrap();
        let restored: ChatEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, event);
    }
}
