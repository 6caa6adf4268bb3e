use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::ExecutionConfig;
use crate::errors::{PilotError, PilotResult};
use crate::executor::action::{Action, FracPoint, RawAction};
use crate::executor::coordinator::{interpolate, normalize};
use crate::executor::desktop::{ButtonHold, Desktop, MouseButton};
use crate::executor::keys::paste_chord;

const DRAG_DURATION: Duration = Duration::from_millis(300);
const DRAG_STEPS: u32 = 15;
const PASTE_DELAY: Duration = Duration::from_millis(100);
const ECHO_CHARS: usize = 50;

/// Result of executing one action. Failures are values, never errors.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ExecutionOutcome {
    fn ok(message: String) -> Self {
        Self {
            success: true,
            message,
            timestamp: chrono::Utc::now(),
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
            timestamp: chrono::Utc::now(),
        }
    }
}

impl std::fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

pub struct ActionExecutor {
    desktop: Arc<dyn Desktop>,
    config: ExecutionConfig,
}

impl ActionExecutor {
    pub fn new(desktop: Arc<dyn Desktop>, config: ExecutionConfig) -> Self {
        Self { desktop, config }
    }

    /// Validate and perform one action. Every error is folded into the outcome.
    pub async fn execute(&self, raw: &RawAction) -> ExecutionOutcome {
        tracing::info!(kind = raw.kind_str(), params = %raw.params, "executing action");

        let action = match Action::try_from(raw) {
            Ok(action) => action,
            Err(e) => {
                tracing::warn!(kind = raw.kind_str(), error = %e, "action rejected");
                return ExecutionOutcome::failed(format!("Action failed: {e}"));
            }
        };

        if let Action::Unknown { kind } = &action {
            tracing::warn!(kind = ?kind, "unknown action type");
            return ExecutionOutcome::failed(format!(
                "Unknown action type: {}",
                kind.as_deref().unwrap_or("<missing>")
            ));
        }

        match self.perform(&action).await {
            Ok(message) => {
                if action.uses_devices() {
                    self.settle().await;
                }
                tracing::info!(success = true, msg = %message, "action complete");
                ExecutionOutcome::ok(message)
            }
            Err(e) => {
                tracing::warn!(error = %e, "action failed");
                ExecutionOutcome::failed(format!("Action failed: {e}"))
            }
        }
    }

    async fn perform(&self, action: &Action) -> PilotResult<String> {
        if self.config.failsafe && action.uses_devices() {
            self.check_failsafe()?;
        }

        let desktop = self.desktop.as_ref();
        match action {
            Action::Click { at, button } => {
                let (x, y) = self.to_pixels(*at)?;
                desktop.click(x, y, *button)?;
                Ok(format!("Clicked ({x}, {y}) with {button} button"))
            }
            Action::DoubleClick { at } => {
                let (x, y) = self.to_pixels(*at)?;
                desktop.double_click(x, y)?;
                Ok(format!("Double-clicked ({x}, {y})"))
            }
            Action::Drag { from, to } => {
                let start = self.to_pixels(*from)?;
                let end = self.to_pixels(*to)?;
                self.drag(start, end).await?;
                Ok(format!(
                    "Dragged from ({}, {}) to ({}, {})",
                    start.0, start.1, end.0, end.1
                ))
            }
            Action::Type { text } => {
                desktop.clipboard_write(text)?;
                tokio::time::sleep(PASTE_DELAY).await;
                desktop.press_keys(&paste_chord())?;
                Ok(format!("Typed text: {}", echo(text)))
            }
            Action::Hotkey { keys } => {
                desktop.press_keys(keys)?;
                Ok(format!("Hotkey: {}", keys.join("+")))
            }
            Action::Scroll { at, amount } => {
                let (x, y) = self.to_pixels(*at)?;
                desktop.move_to(x, y)?;
                desktop.scroll(amount.saturating_mul(self.config.scroll_step))?;
                let direction = if *amount > 0 { "up" } else { "down" };
                Ok(format!(
                    "Scrolled {direction} {} step(s) at ({x}, {y})",
                    amount.unsigned_abs()
                ))
            }
            Action::Wait { seconds } => {
                let delay = Duration::try_from_secs_f64(*seconds)
                    .map_err(|e| PilotError::Executor(format!("invalid wait: {e}")))?;
                tracing::info!(seconds, "waiting");
                tokio::time::sleep(delay).await;
                Ok(format!("Waited {seconds} second(s)"))
            }
            Action::Done { result } => Ok(format!(
                "Task complete: {}",
                result.as_deref().unwrap_or("task finished")
            )),
            Action::Unknown { kind } => Err(PilotError::Executor(format!(
                "Unknown action type: {}",
                kind.as_deref().unwrap_or("<missing>")
            ))),
        }
    }

    async fn drag(&self, start: (i32, i32), end: (i32, i32)) -> PilotResult<()> {
        let desktop = self.desktop.as_ref();
        desktop.move_to(start.0, start.1)?;
        let hold = ButtonHold::press(desktop, MouseButton::Left)?;
        let step_delay = DRAG_DURATION / DRAG_STEPS;
        for (x, y) in interpolate(start, end, DRAG_STEPS) {
            tokio::time::sleep(step_delay).await;
            desktop.move_to(x, y)?;
        }
        hold.release()
    }

    fn to_pixels(&self, at: FracPoint) -> PilotResult<(i32, i32)> {
        let screen = self.desktop.screen_size()?;
        let (x, y) = normalize(at.x, at.y, screen);
        tracing::debug!(fx = at.x, fy = at.y, x, y, %screen, "fraction → pixel");
        Ok((x, y))
    }

    fn check_failsafe(&self) -> PilotResult<()> {
        let screen = self.desktop.screen_size()?;
        let (x, y) = self.desktop.cursor_position()?;
        let max_x = screen.width as i32 - 1;
        let max_y = screen.height as i32 - 1;
        if (x <= 0 || x >= max_x) && (y <= 0 || y >= max_y) {
            return Err(PilotError::FailSafe { x, y });
        }
        Ok(())
    }

    async fn settle(&self) {
        let secs = self.config.delay_between_actions;
        if secs > 0.0 {
            if let Ok(d) = Duration::try_from_secs_f64(secs) {
                tokio::time::sleep(d).await;
            }
        }
    }
}

fn echo(text: &str) -> String {
    if text.chars().count() > ECHO_CHARS {
        let head: String = text.chars().take(ECHO_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
