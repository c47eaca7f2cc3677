//! Agent Loop - drives one turn of the conversation
//!
//! A turn alternates between asking the completion service for a reply and
//! running the tools that reply requests, until the model answers without
//! tool calls. The loop handles:
//! - sending the full transcript and tool list on every round
//! - pairing every tool call with exactly one tool result, in order
//! - cooperative cancellation of the in-flight completion request
//! - reporting a restart request back to the caller

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::chat_log::ChatLog;
use super::types::{Message, SessionOutput, TurnOutcome, TurnStatus};
use crate::error::Result;
use crate::provider::{CompletionRequest, CompletionService, DEFAULT_TEMPERATURE};
use crate::tools::ToolRegistry;

pub struct AgentLoop {
    service: Arc<dyn CompletionService>,
    registry: ToolRegistry,
    temperature: f64,
    /// Optional guard on completion rounds per turn
    max_rounds: Option<usize>,
    output_tx: Option<mpsc::UnboundedSender<SessionOutput>>,
}

impl AgentLoop {
    pub fn new(service: Arc<dyn CompletionService>, registry: ToolRegistry) -> Self {
        Self {
            service,
            registry,
            temperature: DEFAULT_TEMPERATURE,
            max_rounds: None,
            output_tx: None,
        }
    }

    /// Set the sampling temperature sent with every request
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Stop the turn once this many rounds have completed
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }

    /// Send progress events (assistant text, tool activity) to a frontend
    pub fn with_output_channel(mut self, tx: mpsc::UnboundedSender<SessionOutput>) -> Self {
        self.output_tx = Some(tx);
        self
    }

    /// Run one turn starting from a log whose last message is the new user
    /// instruction.
    ///
    /// Completion-service errors are returned as-is. Cancellation is not an
    /// error: the outcome carries the log as of the last complete round.
    pub async fn run_turn(&self, log: ChatLog, cancel: &CancellationToken) -> Result<TurnOutcome> {
        let mut log = log;
        let mut reset_requested = false;
        let mut rounds = 0;

        loop {
            if let Some(max) = self.max_rounds
                && rounds >= max
            {
                warn!(rounds, "Round limit reached, ending turn");
                return Ok(TurnOutcome {
                    log,
                    status: TurnStatus::RoundLimitReached,
                    reset_requested,
                    rounds,
                });
            }

            debug!(round = rounds + 1, messages = log.len(), "Requesting completion");
            let request = CompletionRequest {
                messages: log.messages(),
                tools: self.registry.definitions(),
                temperature: self.temperature,
            };

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.service.complete(request) => Some(result),
            };
            let Some(response) = response else {
                info!(rounds, "Turn cancelled by user");
                self.emit(SessionOutput::Cancelled);
                return Ok(TurnOutcome {
                    log,
                    status: TurnStatus::Cancelled,
                    reset_requested,
                    rounds,
                });
            };
            let candidates = response?;
            rounds += 1;

            // Only the first candidate is used
            let Some(reply) = candidates.into_iter().next() else {
                debug!(round = rounds, "Completion returned no candidates");
                return Ok(TurnOutcome {
                    log,
                    status: TurnStatus::Done,
                    reset_requested,
                    rounds,
                });
            };

            let content = reply.content.unwrap_or_default();
            let tool_calls = reply.tool_calls;
            log = log.append(Message::assistant(content.clone(), tool_calls.clone()));

            if !content.is_empty() {
                self.emit(SessionOutput::assistant_message(content));
            }

            if tool_calls.is_empty() {
                info!(rounds, "Turn complete");
                return Ok(TurnOutcome {
                    log,
                    status: TurnStatus::Done,
                    reset_requested,
                    rounds,
                });
            }

            for call in &tool_calls {
                self.emit(SessionOutput::tool_start(&call.id, &call.name, call.arguments.clone()));

                let output = self.registry.dispatch(call).await;
                if output.restart_requested {
                    info!(call_id = %call.id, "Session restart requested");
                    reset_requested = true;
                }

                self.emit(SessionOutput::tool_done(
                    &call.id,
                    &call.name,
                    output.success,
                    output.content.clone(),
                ));
                log = log.append(Message::tool(&call.id, output.content));
            }
        }
    }

    fn emit(&self, output: SessionOutput) {
        if let Some(tx) = &self.output_tx {
            // A closed receiver only means nobody is watching
            let _ = tx.send(output);
        }
    }
}
