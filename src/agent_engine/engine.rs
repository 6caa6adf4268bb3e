use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::agent_engine::conversation::Conversation;
use crate::agent_engine::events::{preview, AgentEvent, EventSink};
use crate::agent_engine::interpreter;
use crate::agent_engine::loop_control::LoopController;
use crate::agent_engine::state::{LoopState, SkipReason, TaskOutcome};
use crate::config::{ExecutionConfig, ScreenshotConfig};
use crate::errors::PilotResult;
use crate::executor::desktop::Desktop;
use crate::executor::dispatcher::ActionExecutor;
use crate::llm::provider::LlmProvider;
use crate::llm::types::CallConfig;
use crate::perception::screenshot::encode_frame;

pub const DEFAULT_SYSTEM_PROMPT: &str = include_str!("../../prompts/system.md");

/// Drives the capture → ask → act loop for one task at a time.
///
/// Holds every collaborator explicitly; a fresh conversation and iteration
/// counter are built for each task.
pub struct AgentEngine {
    desktop: Arc<dyn Desktop>,
    provider: Arc<dyn LlmProvider>,
    call_cfg: CallConfig,
    execution: ExecutionConfig,
    screenshot: ScreenshotConfig,
    system_prompt: String,
    executor: ActionExecutor,
    sink: Arc<dyn EventSink>,
}

impl AgentEngine {
    pub fn new(
        desktop: Arc<dyn Desktop>,
        provider: Arc<dyn LlmProvider>,
        call_cfg: CallConfig,
        execution: ExecutionConfig,
        screenshot: ScreenshotConfig,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let executor = ActionExecutor::new(desktop.clone(), execution.clone());
        Self {
            desktop,
            provider,
            call_cfg,
            execution,
            screenshot,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            executor,
            sink,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn set_max_iterations(&mut self, max: u32) {
        self.execution.max_iterations = max;
    }

    /// Run `task` until the model reports completion or the iteration bound
    /// is hit. Only backend and capture failures end the run with an error.
    pub async fn run_task(&self, task: &str) -> PilotResult<TaskOutcome> {
        let task_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("task", id = %task_id);
        self.run_task_inner(task_id, task).instrument(span).await
    }

    async fn run_task_inner(&self, task_id: uuid::Uuid, task: &str) -> PilotResult<TaskOutcome> {
        let screen = self.desktop.screen_size()?;
        tracing::info!(task = %task, %screen, provider = %self.provider.name(), "task started");
        self.sink.emit(&AgentEvent::TaskStarted {
            task_id,
            task: task.to_string(),
            screen,
        });

        let mut conversation = Conversation::new(&self.system_prompt, task);
        let mut loop_ctrl = LoopController::new(self.execution.max_iterations);
        let mut state = LoopState::Running { iteration: 0 };

        while let Some(iteration) = loop_ctrl.advance() {
            state = LoopState::Running { iteration };
            self.sink.emit(&AgentEvent::IterationStarted {
                iteration,
                max_iterations: loop_ctrl.max_iterations(),
            });

            let frame = self.desktop.capture()?;
            let encoded = encode_frame(&frame, &self.screenshot)?;
            conversation.push_observation(&encoded);

            tracing::info!(iteration, messages = conversation.len(), "calling LLM");
            let response = self
                .provider
                .chat(conversation.messages(), &self.call_cfg)
                .await?;
            if !response.reasoning.is_empty() {
                tracing::debug!(iteration, reasoning = %response.reasoning, "model reasoning");
            }

            let reply = match response.content {
                Some(text) if !text.trim().is_empty() => text,
                _ => {
                    tracing::warn!(iteration, "empty reply, skipping iteration");
                    self.sink.emit(&AgentEvent::IterationSkipped {
                        iteration,
                        reason: SkipReason::EmptyReply,
                    });
                    continue;
                }
            };

            conversation.push_assistant(&reply);
            self.sink.emit(&AgentEvent::ReplyReceived {
                preview: preview(&reply),
            });

            let Some(decision) = interpreter::parse(&reply) else {
                tracing::warn!(iteration, reply_len = reply.len(), "unparseable reply, skipping iteration");
                self.sink.emit(&AgentEvent::IterationSkipped {
                    iteration,
                    reason: SkipReason::Unparseable,
                });
                continue;
            };

            self.sink.emit(&AgentEvent::Thought {
                text: decision.thought.clone(),
            });

            let outcome = self.executor.execute(&decision.action).await;
            self.sink.emit(&AgentEvent::ActionExecuted {
                kind: decision.action.kind_str().to_string(),
                outcome: outcome.clone(),
            });

            if decision.is_terminal() {
                let reason = if decision.completion_reason.is_empty() {
                    outcome.message.clone()
                } else {
                    decision.completion_reason.clone()
                };
                tracing::info!(iteration, reason = %reason, "task completed");
                state = LoopState::Completed { reason };
                break;
            }

            self.pause_between_loops().await;
        }

        if matches!(state, LoopState::Running { .. }) {
            tracing::warn!(max = loop_ctrl.max_iterations(), "iteration limit reached");
            state = LoopState::Exhausted;
        }

        let outcome = TaskOutcome {
            task_id,
            iterations: loop_ctrl.iteration(),
            max_iterations: loop_ctrl.max_iterations(),
            state,
        };
        self.sink.emit(&AgentEvent::TaskFinished {
            outcome: outcome.clone(),
        });
        Ok(outcome)
    }

    async fn pause_between_loops(&self) {
        let secs = self.execution.delay_between_loops;
        if secs > 0.0 {
            if let Ok(d) = Duration::try_from_secs_f64(secs) {
                tokio::time::sleep(d).await;
            }
        }
    }
}
