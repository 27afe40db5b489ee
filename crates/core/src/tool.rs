//! Tool trait, registry, and invocation types.
//!
//! Tools are what let the agent act in the world: run shell commands,
//! read and write files, search, fetch URLs, evaluate code. Each tool is a
//! pure-effect boundary — whatever happens inside, the caller gets back a
//! `ToolResult` (or a typed `ToolError` the loop renders into one), never an
//! escaped panic.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ToolError;
use crate::schema::ToolParams;

/// Output cap for interactive display of a tool result.
pub const DISPLAY_OUTPUT_CAP: usize = 2_000;

/// A request to execute a tool.
///
/// `arguments` is whatever JSON shape the model produced — an object, a
/// string-encoded object, or worse. The normalizer turns it into a typed
/// mapping before dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque call id; synthesized when the wire omits one.
    pub id: String,

    /// Name of the tool to execute.
    pub name: String,

    /// Raw arguments as produced by the model.
    pub arguments: serde_json::Value,
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The output content (what the model observes next turn).
    pub output: String,

    /// Whether the tool considers the invocation successful.
    pub success: bool,

    /// Whether `output` was cut at a truncation boundary.
    pub truncated: bool,

    /// Length of the untruncated output, in characters.
    pub total_len: usize,
}

impl ToolResult {
    /// A successful, untruncated result.
    pub fn ok(output: impl Into<String>) -> Self {
        let output = output.into();
        let total_len = output.chars().count();
        Self {
            output,
            success: true,
            truncated: false,
            total_len,
        }
    }

    /// A failed result with the error description as the observable output.
    pub fn error(output: impl Into<String>) -> Self {
        let output = output.into();
        let total_len = output.chars().count();
        Self {
            output,
            success: false,
            truncated: false,
            total_len,
        }
    }

    /// Cap `output` at `cap` characters, marking the result truncated and
    /// appending an indicator when the boundary is hit.
    pub fn truncate_to(mut self, cap: usize) -> Self {
        if self.output.chars().count() > cap {
            let kept: String = self.output.chars().take(cap).collect();
            let dropped = self.total_len - cap;
            self.output = format!("{kept}\n...({dropped} chars truncated)");
            self.truncated = true;
        }
        self
    }

    /// The output capped for interactive display panels.
    pub fn display_output(&self) -> String {
        if self.output.chars().count() <= DISPLAY_OUTPUT_CAP {
            return self.output.clone();
        }
        let kept: String = self.output.chars().take(DISPLAY_OUTPUT_CAP).collect();
        let dropped = self.output.chars().count() - DISPLAY_OUTPUT_CAP;
        format!("{kept}\n...({dropped} chars truncated)")
    }
}

/// A tool definition as sent to the inference server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the parameters, rendered from `ToolParams`.
    pub parameters: serde_json::Value,
}

/// The core Tool trait.
///
/// Each built-in (shell, read_file, write_file, grep, fetch_url, ...)
/// implements this. Tools are registered in the `ToolRegistry` and made
/// available to the agent loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "shell", "read_file").
    fn name(&self) -> &str;

    /// What this tool does, sent to the model.
    fn description(&self) -> &str;

    /// Typed parameter declarations.
    fn parameters(&self) -> ToolParams;

    /// Execute the tool with normalized arguments.
    async fn execute(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a definition for the inference server.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters().to_json_schema(),
        }
    }
}

/// A registry of available tools, dispatched by name.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        if let Some(&idx) = self.by_name.get(&name) {
            self.tools[idx] = tool;
        } else {
            self.by_name.insert(name, self.tools.len());
            self.tools.push(tool);
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.by_name.get(name).map(|&i| self.tools[i].as_ref())
    }

    /// All tool definitions, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// All registered tools, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Tool> {
        self.tools.iter().map(|t| t.as_ref())
    }

    /// Execute a call whose arguments have already been normalized.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> std::result::Result<ToolResult, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.execute(arguments).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
