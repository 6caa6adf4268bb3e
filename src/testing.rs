//! In-memory stand-ins for the desktop, the model backend and the operator.
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::agent_engine::events::{AgentEvent, EventSink};
use crate::errors::{PilotError, PilotResult};
use crate::executor::desktop::{Desktop, MouseButton};
use crate::llm::provider::LlmProvider;
use crate::llm::types::{CallConfig, ChatMessage, LlmResponse};
use crate::perception::types::{ScreenFrame, ScreenSize};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    MoveTo(i32, i32),
    Click(i32, i32, MouseButton),
    DoubleClick(i32, i32),
    MouseDown(MouseButton),
    MouseUp(MouseButton),
    Keys(Vec<String>),
    Scroll(i32),
    Clipboard(String),
}

/// Records every device call; key names are validated like the real backend.
pub struct FakeDesktop {
    size: ScreenSize,
    cursor: Mutex<(i32, i32)>,
    calls: Mutex<Vec<Call>>,
    captures: Mutex<u32>,
    moves: Mutex<u32>,
    fail_moves_after: Mutex<Option<u32>>,
}

impl FakeDesktop {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: ScreenSize { width, height },
            cursor: Mutex::new((width as i32 / 2, height as i32 / 2)),
            calls: Mutex::new(Vec::new()),
            captures: Mutex::new(0),
            moves: Mutex::new(0),
            fail_moves_after: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn captures(&self) -> u32 {
        *self.captures.lock().unwrap()
    }

    pub fn set_cursor(&self, x: i32, y: i32) {
        *self.cursor.lock().unwrap() = (x, y);
    }

    /// Let the first `n` `move_to` calls succeed and fail every later one.
    pub fn fail_move_after(&self, n: u32) {
        *self.fail_moves_after.lock().unwrap() = Some(n);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Desktop for FakeDesktop {
    fn screen_size(&self) -> PilotResult<ScreenSize> {
        Ok(self.size)
    }

    fn capture(&self) -> PilotResult<ScreenFrame> {
        *self.captures.lock().unwrap() += 1;
        Ok(ScreenFrame::new(image::RgbaImage::new(8, 8)))
    }

    fn cursor_position(&self) -> PilotResult<(i32, i32)> {
        Ok(*self.cursor.lock().unwrap())
    }

    fn move_to(&self, x: i32, y: i32) -> PilotResult<()> {
        let mut moves = self.moves.lock().unwrap();
        *moves += 1;
        if let Some(limit) = *self.fail_moves_after.lock().unwrap() {
            if *moves > limit {
                return Err(PilotError::Executor("pointer device unplugged".into()));
            }
        }
        self.record(Call::MoveTo(x, y));
        Ok(())
    }

    fn click(&self, x: i32, y: i32, button: MouseButton) -> PilotResult<()> {
        self.record(Call::Click(x, y, button));
        Ok(())
    }

    fn double_click(&self, x: i32, y: i32) -> PilotResult<()> {
        self.record(Call::DoubleClick(x, y));
        Ok(())
    }

    fn mouse_down(&self, button: MouseButton) -> PilotResult<()> {
        self.record(Call::MouseDown(button));
        Ok(())
    }

    fn mouse_up(&self, button: MouseButton) -> PilotResult<()> {
        self.record(Call::MouseUp(button));
        Ok(())
    }

    fn press_keys(&self, keys: &[String]) -> PilotResult<()> {
        crate::executor::keys::map_chord(keys)?;
        self.record(Call::Keys(keys.to_vec()));
        Ok(())
    }

    fn scroll(&self, notches: i32) -> PilotResult<()> {
        self.record(Call::Scroll(notches));
        Ok(())
    }

    fn clipboard_write(&self, text: &str) -> PilotResult<()> {
        self.record(Call::Clipboard(text.to_string()));
        Ok(())
    }
}

/// Replays a fixed list of replies and remembers what it was sent.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<PilotResult<Option<String>>>>,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<PilotResult<Option<&str>>>) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(|o| o.map(str::to_string)))
                    .collect(),
            ),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn message_counts(&self) -> Vec<usize> {
        self.seen.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.seen.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, messages: &[ChatMessage], _cfg: &CallConfig) -> PilotResult<LlmResponse> {
        self.seen.lock().unwrap().push(messages.to_vec());
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PilotError::LlmProvider("script exhausted".into())))?;
        Ok(LlmResponse {
            content: next,
            reasoning: String::new(),
        })
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AgentEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<AgentEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &AgentEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
