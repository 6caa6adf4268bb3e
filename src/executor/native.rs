//! Real desktop backend: enigo for input, xcap for capture, arboard for the clipboard.
use std::sync::{Mutex, MutexGuard};

use enigo::{Axis, Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use xcap::Monitor;

use crate::errors::{PilotError, PilotResult};
use crate::executor::desktop::{Desktop, MouseButton};
use crate::executor::keys::map_chord;
use crate::perception::types::{ScreenFrame, ScreenSize};

pub struct NativeDesktop {
    enigo: Mutex<Enigo>,
    // Held for the process lifetime: on X11/Wayland the clipboard owner must
    // stay alive for the pasted text to remain available.
    clipboard: Mutex<arboard::Clipboard>,
}

impl NativeDesktop {
    pub fn new() -> PilotResult<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| PilotError::Executor(format!("input backend init failed: {e}")))?;
        let clipboard = arboard::Clipboard::new()
            .map_err(|e| PilotError::Executor(format!("clipboard init failed: {e}")))?;
        Ok(Self {
            enigo: Mutex::new(enigo),
            clipboard: Mutex::new(clipboard),
        })
    }

    fn enigo(&self) -> PilotResult<MutexGuard<'_, Enigo>> {
        self.enigo
            .lock()
            .map_err(|_| PilotError::Executor("input backend lock poisoned".into()))
    }

    fn primary_monitor() -> PilotResult<Monitor> {
        let monitors = Monitor::all()
            .map_err(|e| PilotError::Perception(format!("list monitors: {e}")))?;
        let index = monitors.iter().position(|m| m.is_primary()).unwrap_or(0);
        monitors
            .into_iter()
            .nth(index)
            .ok_or_else(|| PilotError::Perception("no monitor found".into()))
    }
}

fn map_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
    }
}

/// Two clicks back to back, well inside any OS double-click interval.
/// No sleep here: this runs on the async executor's thread.
fn click_twice(mut click: impl FnMut() -> PilotResult<()>) -> PilotResult<()> {
    click()?;
    click()
}

fn input_err(op: &str, e: enigo::InputError) -> PilotError {
    PilotError::Executor(format!("{op} failed: {e}"))
}

impl Desktop for NativeDesktop {
    fn screen_size(&self) -> PilotResult<ScreenSize> {
        let (w, h) = self
            .enigo()?
            .main_display()
            .map_err(|e| input_err("display size", e))?;
        Ok(ScreenSize {
            width: w.max(0) as u32,
            height: h.max(0) as u32,
        })
    }

    fn capture(&self) -> PilotResult<ScreenFrame> {
        let monitor = Self::primary_monitor()?;
        let image = monitor
            .capture_image()
            .map_err(|e| PilotError::Perception(format!("capture: {e}")))?;
        tracing::debug!(
            monitor = %monitor.name(),
            width = image.width(),
            height = image.height(),
            scale = monitor.scale_factor(),
            "screen captured"
        );
        Ok(ScreenFrame::new(image))
    }

    fn cursor_position(&self) -> PilotResult<(i32, i32)> {
        self.enigo()?
            .location()
            .map_err(|e| input_err("cursor location", e))
    }

    fn move_to(&self, x: i32, y: i32) -> PilotResult<()> {
        self.enigo()?
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| input_err("mouse move", e))
    }

    fn click(&self, x: i32, y: i32, button: MouseButton) -> PilotResult<()> {
        let mut enigo = self.enigo()?;
        enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| input_err("mouse move", e))?;
        enigo
            .button(map_button(button), Direction::Click)
            .map_err(|e| input_err("click", e))
    }

    fn double_click(&self, x: i32, y: i32) -> PilotResult<()> {
        let mut enigo = self.enigo()?;
        enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| input_err("mouse move", e))?;
        click_twice(|| {
            enigo
                .button(Button::Left, Direction::Click)
                .map_err(|e| input_err("click", e))
        })
    }

    fn mouse_down(&self, button: MouseButton) -> PilotResult<()> {
        self.enigo()?
            .button(map_button(button), Direction::Press)
            .map_err(|e| input_err("mouse down", e))
    }

    fn mouse_up(&self, button: MouseButton) -> PilotResult<()> {
        self.enigo()?
            .button(map_button(button), Direction::Release)
            .map_err(|e| input_err("mouse up", e))
    }

    fn press_keys(&self, keys: &[String]) -> PilotResult<()> {
        let chord = map_chord(keys)?;
        let mut enigo = self.enigo()?;

        let mut pressed: Vec<Key> = Vec::with_capacity(chord.len());
        let mut result = Ok(());
        for key in &chord {
            if let Err(e) = enigo.key(*key, Direction::Press) {
                result = Err(input_err("key press", e));
                break;
            }
            pressed.push(*key);
        }
        // Release whatever went down, even after a failed press.
        for key in pressed.iter().rev() {
            if let Err(e) = enigo.key(*key, Direction::Release) {
                tracing::error!(key = ?key, error = %e, "key release failed");
                if result.is_ok() {
                    result = Err(input_err("key release", e));
                }
            }
        }
        result
    }

    fn scroll(&self, notches: i32) -> PilotResult<()> {
        // enigo scrolls down for positive lengths.
        self.enigo()?
            .scroll(-notches, Axis::Vertical)
            .map_err(|e| input_err("scroll", e))
    }

    fn clipboard_write(&self, text: &str) -> PilotResult<()> {
        let mut clipboard = self
            .clipboard
            .lock()
            .map_err(|_| PilotError::Executor("clipboard lock poisoned".into()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| PilotError::Executor(format!("clipboard write failed: {e}")))
    }
}
