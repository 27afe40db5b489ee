//! Interactive REPL and one-shot drivers.
//!
//! The REPL owns the conversation between turns: slash commands may clear,
//! save, or load it, but never while a turn is in flight. Ctrl-C during a
//! turn drops the turn future at its current suspension point, which leaves
//! the history consistent (only fully-completed messages are ever appended).

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::sync::mpsc;

use llamaloop_agent::{Agent, AgentEvent, TurnOutcome};
use llamaloop_core::{ChatTransport, Conversation, Error, Role};

use crate::render::render_event;

const HELP_TEXT: &str = "llamaloop — Commands

  /help            Show this help
  /tools           List available tools
  /clear           Clear conversation history
  /model <name>    Switch model
  /models          List available Ollama models
  /history         Show conversation history
  /save <file>     Save conversation to JSON file
  /load <file>     Load conversation from JSON file
  /exit            Exit (also: Ctrl+D)

Tips:
  - Pipe input:  echo \"what files are here?\" | llamaloop
  - One-shot:    llamaloop \"write me a hello world in Rust\"
  - Pick model:  llamaloop -m llama3.2";

/// Assemble the one-shot query from the positional argument and/or stdin.
pub async fn one_shot_query(
    query: Option<&str>,
    piped: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    if !piped {
        return Ok(query.unwrap_or_default().to_string());
    }
    let mut stdin_text = String::new();
    tokio::io::stdin().read_to_string(&mut stdin_text).await?;
    let stdin_text = stdin_text.trim();
    Ok(match query {
        Some(q) => format!("{q}\n\n{stdin_text}"),
        None => stdin_text.to_string(),
    })
}

/// Drive one turn, rendering events live and honoring Ctrl-C.
///
/// Returns `Ok(None)` when the turn was interrupted.
async fn drive_turn(
    agent: &Agent,
    conversation: &mut Conversation,
    input: &str,
) -> Result<Option<TurnOutcome>, Error> {
    let (tx, mut rx) = mpsc::channel::<AgentEvent>(64);
    let mut streamed = false;

    let turn = agent.run_turn(conversation, input, &tx);
    tokio::pin!(turn);

    let outcome = loop {
        tokio::select! {
            result = &mut turn => break result,
            event = rx.recv() => {
                if let Some(event) = event {
                    render_event(&event, &mut streamed);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                if streamed {
                    println!();
                }
                println!("[interrupted]");
                return Ok(None);
            }
        }
    };

    // The turn is finished; drain whatever the renderer hasn't shown yet.
    while let Ok(event) = rx.try_recv() {
        render_event(&event, &mut streamed);
    }
    if streamed {
        println!();
    }
    outcome.map(Some)
}

/// One-shot mode: a single turn, errors to stderr, nonzero exit on failure.
pub async fn run_once(
    agent: &Agent,
    conversation: &mut Conversation,
    query: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if query.trim().is_empty() {
        return Err("Empty query".into());
    }
    match drive_turn(agent, conversation, query).await {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// The interactive loop.
pub async fn run(
    agent: &mut Agent,
    conversation: &mut Conversation,
    transport: &dyn ChatTransport,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("llamaloop — model: {}, tools: {}", agent.model(), agent.tools().len());
    println!("Type /help for commands, /exit to quit.");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("\nYou: ");
        use std::io::Write;
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            // EOF (Ctrl+D)
            println!("\nGoodbye.");
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            if handle_command(command, agent, conversation, transport).await? {
                break;
            }
            continue;
        }

        match drive_turn(agent, conversation, input).await {
            Ok(_) => {}
            Err(e) => eprintln!("Error: {e}"),
        }
    }

    Ok(())
}

/// Handle a slash command. Returns true when the REPL should exit.
async fn handle_command(
    command: &str,
    agent: &mut Agent,
    conversation: &mut Conversation,
    transport: &dyn ChatTransport,
) -> Result<bool, Box<dyn std::error::Error>> {
    let (cmd, arg) = match command.split_once(char::is_whitespace) {
        Some((c, a)) => (c, a.trim()),
        None => (command, ""),
    };

    match cmd {
        "exit" | "quit" => {
            println!("Goodbye.");
            return Ok(true);
        }
        "help" => println!("{HELP_TEXT}"),
        "clear" => {
            conversation.clear();
            println!("Conversation cleared.");
        }
        "tools" => {
            for tool in agent.tools().iter() {
                let desc: String = tool.description().chars().take(80).collect();
                println!("  {}  {desc}", tool.name());
            }
        }
        "models" => match transport.list_models().await {
            Ok(models) => {
                for m in models {
                    let marker = if m == agent.model() { "*" } else { " " };
                    println!("  {marker} {m}");
                }
            }
            Err(e) => eprintln!("Error: {e}"),
        },
        "model" => {
            if arg.is_empty() {
                println!("Current model: {}", agent.model());
            } else {
                agent.set_model(arg);
                println!("Switched to {arg}");
            }
        }
        "history" => {
            for (i, msg) in conversation.messages.iter().enumerate() {
                let role = match msg.role {
                    Role::System => "SYSTEM",
                    Role::User => "USER",
                    Role::Assistant => "ASSISTANT",
                    Role::Tool => "TOOL",
                };
                let preview: String = msg.content.chars().take(200).collect();
                println!("{i} {role}: {preview}");
            }
        }
        "save" => {
            let path = if arg.is_empty() { "conversation.json" } else { arg };
            match save_history(conversation, path) {
                Ok(count) => println!("Saved {count} messages to {path}"),
                Err(e) => eprintln!("Error: {e}"),
            }
        }
        "load" => {
            if arg.is_empty() {
                eprintln!("Usage: /load <file>");
            } else {
                match load_history(arg) {
                    Ok(loaded) => {
                        println!("Loaded {} messages from {arg}", loaded.len());
                        *conversation = loaded;
                    }
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
        }
        other => println!("Unknown command: /{other}. Type /help."),
    }

    Ok(false)
}

fn save_history(conversation: &Conversation, path: &str) -> Result<usize, Error> {
    let json = serde_json::to_string_pretty(conversation)?;
    std::fs::write(path, json).map_err(|e| Error::Internal(e.to_string()))?;
    Ok(conversation.len())
}

fn load_history(path: &str) -> Result<Conversation, Error> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::Internal(e.to_string()))?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use llamaloop_core::{Message, ToolCall};

    #[test]
    fn history_roundtrip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conv.json");

        let mut conv = Conversation::with_system("sys");
        conv.push(Message::user("question"));
        conv.push(Message::assistant_with_calls(
            "",
            vec![ToolCall {
                id: "call_1".into(),
                name: "shell".into(),
                arguments: serde_json::json!({"command": "ls"}),
            }],
        ));
        conv.push(Message::tool_result("call_1", "files"));
        conv.push(Message::assistant("done"));

        let count = save_history(&conv, path.to_str().unwrap()).unwrap();
        assert_eq!(count, 5);

        let restored = load_history(path.to_str().unwrap()).unwrap();
        assert_eq!(restored, conv);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(load_history("/tmp/llamaloop_missing_history.json").is_err());
    }

    #[tokio::test]
    async fn one_shot_query_prefers_argument_when_not_piped() {
        let q = one_shot_query(Some("hello"), false).await.unwrap();
        assert_eq!(q, "hello");
    }
}
