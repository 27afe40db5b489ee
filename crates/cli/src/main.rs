//! llamaloop — a local AI agent for Ollama, in your terminal.
//!
//! Usage:
//!   llamaloop                          # interactive mode, default model
//!   llamaloop -m qwen2.5-coder         # pick a model
//!   llamaloop --no-tools "summarise"   # disable tool use
//!   llamaloop "what files are here?"   # one-shot query
//!   echo "summarise this" | llamaloop  # pipe stdin

use clap::Parser;
use std::io::IsTerminal;
use std::sync::Arc;

use llamaloop_agent::Agent;
use llamaloop_config::AppConfig;
use llamaloop_core::{ChatTransport, Conversation};
use llamaloop_transport::OllamaTransport;

mod render;
mod repl;

#[derive(Parser)]
#[command(
    name = "llamaloop",
    about = "A local AI agent powered by Ollama",
    version
)]
struct Cli {
    /// One-shot query (non-interactive)
    query: Option<String>,

    /// Model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Ollama base URL
    #[arg(long)]
    url: Option<String>,

    /// Disable all tools
    #[arg(long)]
    no_tools: bool,

    /// Max agentic iterations per turn
    #[arg(long)]
    max_iter: Option<u32>,

    /// List available models and exit
    #[arg(long)]
    list_models: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

const SYSTEM_PROMPT: &str = "You are a highly capable local AI agent. You have access to tools that let you:
- Run shell commands
- Read, write, and search files
- Execute Python code
- Fetch URLs

Always use the minimum tools necessary. Think step-by-step.
When writing code or files, verify the result. Be concise but thorough.
If a task is ambiguous, clarify before acting.
Current working directory: {cwd}";

fn system_prompt(config: &AppConfig) -> String {
    let cwd = std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| ".".into());
    match &config.system_prompt_override {
        Some(prompt) => prompt.replace("{cwd}", &cwd),
        None => SYSTEM_PROMPT.replace("{cwd}", &cwd),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::load()?;
    if let Some(url) = &cli.url {
        config.base_url = url.clone();
    }
    if let Some(model) = &cli.model {
        config.default_model = model.clone();
    }
    if cli.no_tools {
        config.tools_enabled = false;
    }
    if let Some(max) = cli.max_iter {
        config.max_iterations = max;
    }

    let transport = Arc::new(OllamaTransport::new(&config.base_url));

    // Verify the server is reachable before doing anything else.
    let available = match transport.list_models().await {
        Ok(models) => models,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("Is Ollama running? Try: ollama serve");
            std::process::exit(1);
        }
    };

    if cli.list_models {
        for m in &available {
            let marker = if *m == config.default_model { "*" } else { " " };
            println!("  {marker} {m}");
        }
        return Ok(());
    }

    if !available.iter().any(|m| *m == config.default_model) {
        eprintln!(
            "Warning: model '{}' not found locally. Ollama may try to pull it.",
            config.default_model
        );
        if !available.is_empty() {
            eprintln!("Available: {}", available.join(", "));
        }
    }

    let tools = Arc::new(llamaloop_tools::default_registry());
    let agent = Agent::new(transport.clone(), tools, &config.default_model)
        .with_tools_enabled(config.tools_enabled)
        .with_max_iterations(config.max_iterations);

    let mut conversation = Conversation::with_system(system_prompt(&config));

    // ── One-shot mode (query arg or piped stdin) ──
    let piped = !std::io::stdin().is_terminal();
    if cli.query.is_some() || piped {
        let query = repl::one_shot_query(cli.query.as_deref(), piped).await?;
        repl::run_once(&agent, &mut conversation, &query).await?;
        return Ok(());
    }

    // ── Interactive REPL ──
    let mut agent = agent;
    repl::run(&mut agent, &mut conversation, transport.as_ref()).await?;

    // Remember the last used model for next time.
    config.default_model = agent.model().to_string();
    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "Could not persist config");
    }

    Ok(())
}
