//! Core domain types and traits for llamaloop.
//!
//! This crate defines the value objects that flow through the agent:
//! messages and conversations, tool calls and results, the typed tool
//! parameter schema, the transport contract against the inference server,
//! and the error taxonomy.

pub mod error;
pub mod message;
pub mod schema;
pub mod tool;
pub mod transport;

pub use error::{ConfigError, Error, NormalizeError, Result, ToolError, TransportError};
pub use message::{Conversation, Message, Role};
pub use schema::{ParamKind, ParamSpec, ToolParams};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolRegistry, ToolResult};
pub use transport::{ChatEvent, ChatRequest, ChatTransport, EventReceiver};
