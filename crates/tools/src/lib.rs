//! Built-in tool implementations for llamaloop.
//!
//! Tools give the agent the ability to interact with the world: run shell
//! commands, read/write/edit files, search the filesystem, fetch URLs, and
//! evaluate code. Every tool returns a `ToolResult` no matter what goes
//! wrong inside — failures are rendered in-band so the model can observe
//! them and correct course on the next turn.

pub mod edit_file;
pub mod fetch_url;
pub mod find_files;
pub mod grep;
pub mod list_dir;
pub mod python_eval;
pub mod read_file;
pub mod shell;
pub mod write_file;

use llamaloop_core::ToolRegistry;

/// Create the default registry with all built-in tools.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(shell::ShellTool));
    registry.register(Box::new(read_file::ReadFileTool));
    registry.register(Box::new(write_file::WriteFileTool));
    registry.register(Box::new(edit_file::EditFileTool));
    registry.register(Box::new(list_dir::ListDirTool));
    registry.register(Box::new(find_files::FindFilesTool));
    registry.register(Box::new(grep::GrepTool));
    registry.register(Box::new(python_eval::PythonEvalTool));
    registry.register(Box::new(run_tests::RunTestsTool));
    registry.register(Box::new(fetch_url::FetchUrlTool::new()));
    registry
}

/// Pull an optional string argument.
pub(crate) fn opt_str(
    args: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Option<String> {
    args.get(key).and_then(|v| v.as_str()).map(String::from)
}

/// Pull a required string argument, reporting its absence in-band.
pub(crate) fn req_str(
    args: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Result<String, llamaloop_core::ToolError> {
    opt_str(args, key)
        .ok_or_else(|| llamaloop_core::ToolError::InvalidArguments(format!("Missing '{key}'")))
}
