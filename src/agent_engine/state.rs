/// Lifecycle of one task run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoopState {
    Running { iteration: u32 },
    Completed { reason: String },
    /// The iteration bound was hit before the model signalled completion.
    Exhausted,
}

/// Final report of a task run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TaskOutcome {
    pub task_id: uuid::Uuid,
    pub iterations: u32,
    pub max_iterations: u32,
    pub state: LoopState,
}

impl TaskOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self.state, LoopState::Completed { .. })
    }
}

/// Why an iteration ended without executing an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    EmptyReply,
    Unparseable,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SkipReason::EmptyReply => "model returned an empty reply",
            SkipReason::Unparseable => "could not parse the model reply",
        })
    }
}
