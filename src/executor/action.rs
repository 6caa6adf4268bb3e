use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{PilotError, PilotResult};
use crate::executor::desktop::MouseButton;

/// Action exactly as the model sent it: `{"type": "...", "params": {...}}`.
/// Parameters stay untyped until execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawAction {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub params: serde_json::Value,
}

impl Default for RawAction {
    fn default() -> Self {
        Self {
            kind: None,
            params: serde_json::Value::Object(Default::default()),
        }
    }
}

impl RawAction {
    /// Lenient extraction: a non-string `type` counts as missing and
    /// non-object params as empty.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let mut raw = Self {
            kind: value.get("type").and_then(|t| t.as_str()).map(str::to_string),
            ..Self::default()
        };
        if let Some(p @ serde_json::Value::Object(_)) = value.get("params") {
            raw.params = p.clone();
        }
        raw
    }

    pub fn kind_str(&self) -> &str {
        self.kind.as_deref().unwrap_or("<missing>")
    }

    pub fn is_done(&self) -> bool {
        self.kind.as_deref() == Some("done")
    }
}

/// Fractional screen position.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FracPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Click { at: FracPoint, button: MouseButton },
    DoubleClick { at: FracPoint },
    Drag { from: FracPoint, to: FracPoint },
    Type { text: String },
    Hotkey { keys: Vec<String> },
    Scroll { at: FracPoint, amount: i32 },
    Wait { seconds: f64 },
    Done { result: Option<String> },
    Unknown { kind: Option<String> },
}

#[derive(Deserialize)]
struct ClickParams {
    x: f64,
    y: f64,
    #[serde(default)]
    button: MouseButton,
}

#[derive(Deserialize)]
struct DragParams {
    start_x: f64,
    start_y: f64,
    end_x: f64,
    end_y: f64,
}

#[derive(Deserialize)]
struct TypeParams {
    text: String,
}

#[derive(Deserialize)]
struct HotkeyParams {
    keys: Vec<String>,
}

#[derive(Deserialize)]
struct ScrollParams {
    x: f64,
    y: f64,
    amount: i32,
}

#[derive(Deserialize)]
struct WaitParams {
    seconds: f64,
}

#[derive(Deserialize)]
struct DoneParams {
    #[serde(default)]
    result: serde_json::Value,
}

/// Strings are taken as-is, `null` means no result, anything else is shown as JSON.
fn render_result(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn params<T: DeserializeOwned>(action: &'static str, raw: &RawAction) -> PilotResult<T> {
    serde_json::from_value(raw.params.clone())
        .map_err(|source| PilotError::InvalidParams { action, source })
}

impl TryFrom<&RawAction> for Action {
    type Error = PilotError;

    fn try_from(raw: &RawAction) -> PilotResult<Self> {
        let action = match raw.kind.as_deref() {
            Some("click") => {
                let p: ClickParams = params("click", raw)?;
                Action::Click {
                    at: FracPoint { x: p.x, y: p.y },
                    button: p.button,
                }
            }
            Some("double_click") => {
                let p: FracPoint = params("double_click", raw)?;
                Action::DoubleClick { at: p }
            }
            Some("drag") => {
                let p: DragParams = params("drag", raw)?;
                Action::Drag {
                    from: FracPoint { x: p.start_x, y: p.start_y },
                    to: FracPoint { x: p.end_x, y: p.end_y },
                }
            }
            Some("type") => {
                let p: TypeParams = params("type", raw)?;
                Action::Type { text: p.text }
            }
            Some("hotkey") => {
                let p: HotkeyParams = params("hotkey", raw)?;
                if p.keys.is_empty() {
                    return Err(PilotError::Executor("hotkey needs at least one key".into()));
                }
                Action::Hotkey { keys: p.keys }
            }
            Some("scroll") => {
                let p: ScrollParams = params("scroll", raw)?;
                Action::Scroll {
                    at: FracPoint { x: p.x, y: p.y },
                    amount: p.amount,
                }
            }
            Some("wait") => {
                let p: WaitParams = params("wait", raw)?;
                if !p.seconds.is_finite() || p.seconds < 0.0 {
                    return Err(PilotError::Executor(format!(
                        "wait needs a non-negative number of seconds, got {}",
                        p.seconds
                    )));
                }
                Action::Wait { seconds: p.seconds }
            }
            Some("done") => {
                let p: DoneParams = params("done", raw)?;
                Action::Done {
                    result: render_result(p.result),
                }
            }
            _ => Action::Unknown {
                kind: raw.kind.clone(),
            },
        };
        Ok(action)
    }
}

impl Action {
    /// Whether the action touches mouse, keyboard or clipboard.
    pub fn uses_devices(&self) -> bool {
        !matches!(
            self,
            Action::Wait { .. } | Action::Done { .. } | Action::Unknown { .. }
        )
    }
}
