//! Turns a free-form model reply into a [`Decision`].
//!
//! Two stages: the whole reply as a JSON object, then the span from the first
//! `{` to the last `}` for replies wrapped in prose or markdown fences.
//! Neither stage errors; an unusable reply is simply `None`.
use serde_json::Value;

use crate::executor::action::RawAction;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decision {
    pub thought: String,
    pub action: RawAction,
    pub task_complete: bool,
    pub completion_reason: String,
}

impl Decision {
    fn from_object(obj: &serde_json::Map<String, Value>) -> Self {
        let text = |key: &str| obj.get(key).and_then(Value::as_str).unwrap_or("").to_string();
        Self {
            thought: text("thought"),
            action: obj
                .get("action")
                .filter(|a| a.is_object())
                .map(RawAction::from_value)
                .unwrap_or_default(),
            task_complete: obj
                .get("task_complete")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            completion_reason: text("completion_reason"),
        }
    }

    /// The model asked to stop, either through a `done` action or the flag.
    pub fn is_terminal(&self) -> bool {
        self.action.is_done() || self.task_complete
    }
}

fn parse_object(text: &str) -> Option<Decision> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(obj)) => Some(Decision::from_object(&obj)),
        _ => None,
    }
}

pub fn parse(reply: &str) -> Option<Decision> {
    if let Some(decision) = parse_object(reply.trim()) {
        return Some(decision);
    }

    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end <= start {
        return None;
    }
    let decision = parse_object(&reply[start..=end]);
    if decision.is_some() {
        tracing::debug!(start, end, "decision recovered from surrounding prose");
    }
    decision
}
