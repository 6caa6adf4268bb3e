use serde::Serialize;

use crate::agent_engine::state::{LoopState, SkipReason, TaskOutcome};
use crate::executor::dispatcher::ExecutionOutcome;
use crate::perception::types::ScreenSize;

const PREVIEW_CHARS: usize = 200;

/// Progress notifications for the operator, emitted in loop order.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    TaskStarted {
        task_id: uuid::Uuid,
        task: String,
        screen: ScreenSize,
    },
    IterationStarted {
        iteration: u32,
        max_iterations: u32,
    },
    ReplyReceived {
        preview: String,
    },
    IterationSkipped {
        iteration: u32,
        reason: SkipReason,
    },
    Thought {
        text: String,
    },
    ActionExecuted {
        kind: String,
        outcome: ExecutionOutcome,
    },
    TaskFinished {
        outcome: TaskOutcome,
    },
}

/// Receiver of [`AgentEvent`]s.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &AgentEvent);
}

/// Writes events to stdout, either as readable lines or as JSON lines.
pub struct ConsoleSink {
    json: bool,
}

impl ConsoleSink {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, event: &AgentEvent) {
        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!("event serialization failed: {e}"),
            }
        } else {
            println!("{}", render(event));
        }
    }
}

/// Human-readable form of an event.
pub fn render(event: &AgentEvent) -> String {
    match event {
        AgentEvent::TaskStarted { task, screen, .. } => {
            format!("\nStarting task: {task} (screen {screen})\n")
        }
        AgentEvent::IterationStarted {
            iteration,
            max_iterations,
        } => format!("=== Iteration {iteration}/{max_iterations} ==="),
        AgentEvent::ReplyReceived { preview } => format!("Model reply: {preview}"),
        AgentEvent::IterationSkipped { reason, .. } => format!("Skipped: {reason}"),
        AgentEvent::Thought { text } => format!("Thought: {text}"),
        AgentEvent::ActionExecuted { outcome, .. } => {
            let mark = if outcome.success { "ok" } else { "failed" };
            format!("Result [{mark}]: {outcome}\n")
        }
        AgentEvent::TaskFinished { outcome } => match &outcome.state {
            LoopState::Completed { reason } => {
                format!("\nTask completed after {} iteration(s): {reason}", outcome.iterations)
            }
            LoopState::Exhausted => format!(
                "\nReached the iteration limit ({}), task stopped",
                outcome.max_iterations
            ),
            LoopState::Running { iteration } => {
                format!("\nTask stopped while running iteration {iteration}")
            }
        },
    }
}

/// First [`PREVIEW_CHARS`] characters of a reply, marked when cut.
pub fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
