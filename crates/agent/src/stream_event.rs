//! Agent-level streaming events.
//!
//! `AgentEvent` is what the rendering/REPL layer consumes during a turn:
//! live token deltas, tool invocations and their results, and the terminal
//! notice. One receiver per turn; events arrive in causal order.

use serde::{Deserialize, Serialize};

/// Events emitted by the agent while a turn runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Partial assistant text, forwarded as it arrives from the transport.
    Token { content: String },

    /// The agent is about to execute a tool.
    ToolCall {
        id: String,
        name: String,
        arguments: serde_json::Value,
    },

    /// A tool execution completed (or failed observably).
    ToolResult {
        id: String,
        name: String,
        output: String,
        success: bool,
        truncated: bool,
    },

    /// The final answer for this turn. Emitted at most once.
    Answer { content: String },

    /// A reported condition that is not an answer (e.g. the iteration
    /// budget was exhausted).
    Notice { message: String },
}

impl AgentEvent {
    /// Short tag for logging and panel headers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Token { .. } => "token",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Answer { .. } => "answer",
            Self::Notice { .. } => "notice",
        }
    }
}
