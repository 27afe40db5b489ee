//! Terminal rendering for agent events.
//!
//! Plain-text panels: tool calls in a bordered box with their arguments,
//! results capped at the interactive display limit, token deltas written
//! straight through as they arrive.

use std::io::Write;

use llamaloop_agent::AgentEvent;
use llamaloop_core::tool::DISPLAY_OUTPUT_CAP;

const PANEL_WIDTH: usize = 72;

fn panel(title: &str, body: &str) {
    let bar = "─".repeat(PANEL_WIDTH.saturating_sub(title.len() + 4));
    println!("┌─ {title} {bar}");
    for line in body.lines() {
        println!("│ {line}");
    }
    println!("└{}", "─".repeat(PANEL_WIDTH));
}

/// Cap a result body for display, marking how much was dropped.
fn display_cap(output: &str) -> String {
    let count = output.chars().count();
    if count <= DISPLAY_OUTPUT_CAP {
        return output.to_string();
    }
    let kept: String = output.chars().take(DISPLAY_OUTPUT_CAP).collect();
    format!("{kept}\n... ({} chars truncated)", count - DISPLAY_OUTPUT_CAP)
}

/// Render one agent event to the terminal.
pub fn render_event(event: &AgentEvent, streamed_anything: &mut bool) {
    match event {
        AgentEvent::Token { content } => {
            if !*streamed_anything {
                println!();
                *streamed_anything = true;
            }
            print!("{content}");
            let _ = std::io::stdout().flush();
        }
        AgentEvent::ToolCall {
            name, arguments, ..
        } => {
            if *streamed_anything {
                println!();
                *streamed_anything = false;
            }
            let args = serde_json::to_string_pretty(arguments).unwrap_or_else(|_| "{}".into());
            panel(&format!("tool: {name}"), &args);
        }
        AgentEvent::ToolResult {
            name,
            output,
            success,
            ..
        } => {
            let mark = if *success { "ok" } else { "failed" };
            panel(&format!("result: {name} ({mark})"), &display_cap(output));
        }
        AgentEvent::Answer { content } => {
            // Streamed tokens already put the answer on screen.
            if !*streamed_anything {
                println!();
                println!("{content}");
            } else {
                println!();
                *streamed_anything = false;
            }
        }
        AgentEvent::Notice { message } => {
            if *streamed_anything {
                println!();
                *streamed_anything = false;
            }
            println!("[notice] {message}");
        }
    }
}
