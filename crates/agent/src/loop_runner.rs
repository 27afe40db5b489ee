//! The agent loop — the core state machine.
//!
//! One turn: stream a completion over the current history, decide whether
//! the response is a final answer or a tool-call batch (native or recovered
//! from text), execute the batch strictly in emission order, append the
//! observations, and go around again. The loop ends at a final answer or
//! when the iteration budget runs out.
//!
//! Tool execution within a batch is intentionally serialized: successive
//! calls routinely mutate the same files or shell state, so observable
//! ordering must match the order the model asked for.
//!
//! The returned future is cancel-safe. History is only ever appended to
//! with fully-formed messages, so dropping the future mid-stream (Ctrl-C in
//! the REPL) leaves the conversation consistent and resumable — a partially
//! streamed assistant message lives in a local buffer and is discarded.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use llamaloop_core::{
    ChatEvent, ChatRequest, ChatTransport, Conversation, Error, Message, ToolCall, ToolRegistry,
    ToolResult,
};

use crate::extract::extract_calls;
use crate::normalize::normalize;
use crate::stream_event::AgentEvent;

/// Default budget of tool-call batches per turn.
pub const DEFAULT_MAX_ITERATIONS: u32 = 20;

/// How a turn ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The model produced a plain final answer.
    FinalAnswer(String),
    /// The iteration budget was exhausted before a final answer.
    IterationLimit,
}

/// The agent loop. Owns the transport and tool registry; the conversation
/// is owned by the caller and borrowed for the duration of a turn.
pub struct Agent {
    transport: Arc<dyn ChatTransport>,
    tools: Arc<ToolRegistry>,
    model: String,
    tools_enabled: bool,
    max_iterations: u32,
}

impl Agent {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        tools: Arc<ToolRegistry>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            tools,
            model: model.into(),
            tools_enabled: true,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Set the iteration budget.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Enable or disable tool use entirely.
    pub fn with_tools_enabled(mut self, enabled: bool) -> Self {
        self.tools_enabled = enabled;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Switch the active model (takes effect next turn).
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run one user turn to completion.
    ///
    /// Appends the user message, then loops model → tools until a final
    /// answer or the iteration limit. Token deltas and tool activity are
    /// forwarded through `events` as they happen; send failures are ignored
    /// so a dropped renderer never stalls the turn.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        user_message: &str,
        events: &mpsc::Sender<AgentEvent>,
    ) -> Result<TurnOutcome, Error> {
        conversation.push(Message::user(user_message));

        let tool_defs = if self.tools_enabled {
            self.tools.definitions()
        } else {
            Vec::new()
        };

        info!(model = %self.model, max_iter = self.max_iterations, "Turn starting");

        let mut iterations = 0u32;
        loop {
            let request = ChatRequest {
                model: self.model.clone(),
                messages: conversation.messages.clone(),
                tools: tool_defs.clone(),
            };

            // ── Stream the completion ──
            let mut rx = self.transport.stream_chat(request).await?;
            let mut content = String::new();
            let mut native_calls: Vec<ToolCall> = Vec::new();
            while let Some(event) = rx.recv().await {
                match event? {
                    ChatEvent::Token(token) => {
                        let _ = events
                            .send(AgentEvent::Token {
                                content: token.clone(),
                            })
                            .await;
                    }
                    ChatEvent::Done {
                        content: full,
                        tool_calls,
                        stop_reason,
                    } => {
                        debug!(
                            chars = full.len(),
                            native_calls = tool_calls.len(),
                            stop_reason = stop_reason.as_deref().unwrap_or(""),
                            "Stream done"
                        );
                        content = full;
                        native_calls = tool_calls;
                    }
                }
            }

            // ── Pick the batch: native wins, then text fallback ──
            let batch = if !native_calls.is_empty() {
                native_calls
            } else if self.tools_enabled {
                extract_calls(&content)
            } else {
                Vec::new()
            };

            if batch.is_empty() {
                conversation.push(Message::assistant(&content));
                let _ = events
                    .send(AgentEvent::Answer {
                        content: content.clone(),
                    })
                    .await;
                info!(iterations, "Turn finished with a final answer");
                return Ok(TurnOutcome::FinalAnswer(content));
            }

            // The text is a carrier for the batch here, recorded in history
            // but never surfaced as an answer.
            conversation.push(Message::assistant_with_calls(&content, batch.clone()));

            // ── Execute the batch strictly in emission order ──
            for call in &batch {
                let _ = events
                    .send(AgentEvent::ToolCall {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    })
                    .await;

                let result = self.execute_call(call).await;

                let _ = events
                    .send(AgentEvent::ToolResult {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        output: result.output.clone(),
                        success: result.success,
                        truncated: result.truncated,
                    })
                    .await;

                conversation.push(Message::tool_result(&call.id, &result.output));
            }

            // One batch, one iteration — regardless of how many calls it held.
            iterations += 1;
            if iterations >= self.max_iterations {
                warn!(iterations, "Iteration budget exhausted");
                let notice = format!(
                    "Reached the maximum of {} tool iterations without a final answer. \
                     Stopping here; ask again to continue.",
                    self.max_iterations
                );
                conversation.push(Message::assistant(&notice));
                let _ = events.send(AgentEvent::Notice { message: notice }).await;
                return Ok(TurnOutcome::IterationLimit);
            }
        }
    }

    /// Run one call through normalize → dispatch, rendering every
    /// model-originated failure into the observable result so the model can
    /// self-correct on the next turn.
    async fn execute_call(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.tools.get(&call.name) else {
            warn!(tool = %call.name, "Model requested an unknown tool");
            return ToolResult::error(format!("[error] Unknown tool: {}", call.name));
        };

        let arguments = match normalize(&call.name, &tool.parameters(), call.arguments.clone()) {
            Ok(args) => args,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Argument normalization failed");
                return ToolResult::error(format!("[error] {e}"));
            }
        };

        debug!(tool = %call.name, "Dispatching tool call");
        match tool.execute(arguments).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                ToolResult::error(format!("[error] {e}"))
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
