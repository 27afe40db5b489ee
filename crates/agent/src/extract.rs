//! Text tool-call extractor — fallback for models without native tool
//! calling.
//!
//! Many small local models cannot produce the structured tool-call contract
//! reliably and instead emit the call inside their generated text. This
//! module recognizes the common carrier forms and turns them into the same
//! `ToolCall`s the native path produces, so the loop logic never branches
//! on the model's capabilities.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, trace};

use llamaloop_core::ToolCall;

/// Carrier forms, in priority order. The first form that yields at least
/// one valid call wins; later forms are not consulted.
static PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // <tool_call>{"name":"...", "arguments":{...}}</tool_call>
        Regex::new(r"(?s)<tool_call>\s*(\{.*?\})\s*</tool_call>").expect("static regex"),
        // ```json\n{"name":"...", "arguments":{...}}\n``` (tag optional)
        Regex::new("(?s)```(?:json)?\\s*(\\{[^`]*\"name\"\\s*:[^`]*\\})\\s*```")
            .expect("static regex"),
        // bare JSON: {"name":"...", "arguments":{...}}
        Regex::new(r#"(?s)(\{"name"\s*:\s*"[^"]+"\s*,\s*"arguments"\s*:\s*\{.*\}\s*\})"#)
            .expect("static regex"),
    ]
});

/// Parse one candidate payload. Valid when it is a JSON object with a
/// string `name` and an object `arguments`.
fn parse_candidate(payload: &str) -> Option<(String, Value)> {
    let value: Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => {
            trace!(error = %e, "Skipping malformed tool-call candidate");
            return None;
        }
    };
    let name = value.get("name")?.as_str()?.to_string();
    let arguments = value.get("arguments")?;
    if !arguments.is_object() {
        return None;
    }
    Some((name, arguments.clone()))
}

/// Recognize tool-call intents embedded in plain generated text.
///
/// Returns calls in the order they appear; an empty vec when the text
/// carries none. Malformed candidates are skipped, never fatal.
pub fn extract_calls(raw_text: &str) -> Vec<ToolCall> {
    for pattern in PATTERNS.iter() {
        let calls: Vec<ToolCall> = pattern
            .captures_iter(raw_text)
            .filter_map(|cap| parse_candidate(cap.get(1)?.as_str()))
            .map(|(name, arguments)| ToolCall {
                id: format!("call_{}", uuid::Uuid::new_v4().simple()),
                name,
                arguments,
            })
            .collect();
        if !calls.is_empty() {
            debug!(count = calls.len(), "Extracted tool calls from text");
            return calls;
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_single_tagged_block() {
        let text = r#"I'll read the file.
<tool_call>{"name":"read_file","arguments":{"path":"a.txt"}}</tool_call>"#;
        let calls = extract_calls(text);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "read_file");
        assert_eq!(calls[0].arguments, json!({"path": "a.txt"}));
        assert!(!calls[0].id.is_empty());
    }

    #[test]
    fn extracts_multiple_tagged_blocks_in_order() {
        let text = r#"<tool_call>{"name":"list_dir","arguments":{}}</tool_call>
then
<tool_call>{"name":"read_file","arguments":{"path":"b.txt"}}</tool_call>"#;
        let calls = extract_calls(text);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "list_dir");
        assert_eq!(calls[1].name, "read_file");
    }

    #[test]
    fn extracts_fenced_json_block() {
        let text = "Here is the call:\n```json\n{\"name\": \"shell\", \"arguments\": {\"command\": \"ls\"}}\n```";
        let calls = extract_calls(text);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "shell");
    }

    #[test]
    fn extracts_untagged_fence() {
        let text = "```\n{\"name\": \"shell\", \"arguments\": {\"command\": \"pwd\"}}\n```";
        let calls = extract_calls(text);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].arguments["command"], "pwd");
    }

    #[test]
    fn extracts_bare_json_object() {
        let text = r#"{"name": "grep", "arguments": {"pattern": "fn main"}}"#;
        let calls = extract_calls(text);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "grep");
    }

    #[test]
    fn tagged_blocks_take_priority_over_fences() {
        let text = r#"<tool_call>{"name":"first","arguments":{}}</tool_call>
```json
{"name": "second", "arguments": {}}
```"#;
        let calls = extract_calls(text);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "first");
    }

    #[test]
    fn malformed_json_is_skipped() {
        let text = r#"<tool_call>{not valid json}</tool_call>
<tool_call>{"name":"read_file","arguments":{"path":"ok.txt"}}</tool_call>"#;
        let calls = extract_calls(text);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].arguments["path"], "ok.txt");
    }

    #[test]
    fn missing_arguments_field_is_skipped() {
        let text = r#"<tool_call>{"name":"read_file"}</tool_call>"#;
        assert!(extract_calls(text).is_empty());
    }

    #[test]
    fn non_object_arguments_skipped() {
        let text = r#"<tool_call>{"name":"read_file","arguments":"a.txt"}</tool_call>"#;
        assert!(extract_calls(text).is_empty());
    }

    #[test]
    fn plain_prose_yields_nothing() {
        assert!(extract_calls("The answer is 42.").is_empty());
        assert!(extract_calls("").is_empty());
    }

    #[test]
    fn prose_mentioning_json_yields_nothing() {
        let text = "You could write {\"key\": \"value\"} into the config.";
        assert!(extract_calls(text).is_empty());
    }
}
