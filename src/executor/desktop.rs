use serde::{Deserialize, Serialize};

use crate::errors::PilotResult;
use crate::perception::types::{ScreenFrame, ScreenSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl std::fmt::Display for MouseButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        })
    }
}

/// Platform capabilities the agent drives: screen capture, pointer,
/// keyboard and clipboard. All coordinates are absolute device pixels in
/// the space reported by [`Desktop::screen_size`].
pub trait Desktop: Send + Sync {
    fn screen_size(&self) -> PilotResult<ScreenSize>;

    fn capture(&self) -> PilotResult<ScreenFrame>;

    fn cursor_position(&self) -> PilotResult<(i32, i32)>;

    fn move_to(&self, x: i32, y: i32) -> PilotResult<()>;

    /// Move to `(x, y)` and click once.
    fn click(&self, x: i32, y: i32, button: MouseButton) -> PilotResult<()>;

    fn double_click(&self, x: i32, y: i32) -> PilotResult<()>;

    fn mouse_down(&self, button: MouseButton) -> PilotResult<()>;

    fn mouse_up(&self, button: MouseButton) -> PilotResult<()>;

    /// Press `keys` as one chord: down in order, up in reverse order.
    fn press_keys(&self, keys: &[String]) -> PilotResult<()>;

    /// Scroll the wheel by `notches`; positive scrolls up.
    fn scroll(&self, notches: i32) -> PilotResult<()>;

    fn clipboard_write(&self, text: &str) -> PilotResult<()>;
}

/// Keeps a mouse button held until [`ButtonHold::release`] is called or the
/// hold is dropped, so no exit path leaves the button pressed.
pub struct ButtonHold<'a> {
    desktop: &'a dyn Desktop,
    button: MouseButton,
    held: bool,
}

impl<'a> ButtonHold<'a> {
    pub fn press(desktop: &'a dyn Desktop, button: MouseButton) -> PilotResult<Self> {
        desktop.mouse_down(button)?;
        Ok(Self {
            desktop,
            button,
            held: true,
        })
    }

    pub fn release(mut self) -> PilotResult<()> {
        self.held = false;
        self.desktop.mouse_up(self.button)
    }
}

impl Drop for ButtonHold<'_> {
    fn drop(&mut self) {
        if self.held {
            if let Err(e) = self.desktop.mouse_up(self.button) {
                tracing::error!(button = %self.button, error = %e, "failed to release held mouse button");
            }
        }
    }
}
