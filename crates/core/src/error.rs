//! Error types for the llamaloop domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each bounded context
//! has its own error enum; the policy split matters more than the shapes:
//! errors that originate from the model's own output (bad arguments,
//! unknown tool) are recoverable observations, errors that originate from
//! infrastructure (transport) abort the turn.

use thiserror::Error;

/// The top-level error type for all llamaloop operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Argument error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Connectivity or protocol failure talking to the inference server.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Cannot reach inference server at {url}: {reason}")]
    Connection { url: String, reason: String },

    #[error("Inference server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Malformed or missing tool arguments, detected before dispatch.
#[derive(Debug, Clone, Error)]
pub enum NormalizeError {
    #[error("Missing required parameter '{field}' for tool '{tool}'")]
    MissingRequired { tool: String, field: String },

    #[error("Arguments for tool '{tool}' are not an object (got {got})")]
    NotAnObject { tool: String, got: String },
}

/// A failure inside the tool-dispatch boundary.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to write config at {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("Invalid config: {0}")]
    Invalid(String),
}
