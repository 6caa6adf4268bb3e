use crate::llm::types::{ChatMessage, ContentPart, ImageUrl};
use crate::perception::types::EncodedFrame;

const OBSERVE_PROMPT: &str =
    "Here is the current screenshot. Analyse the screen and decide the next action.";

/// Message history for one task run. Grows without pruning until the run ends.
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(system_prompt: &str, task: &str) -> Self {
        Self {
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user_parts(vec![ContentPart::Text {
                    text: format!("Please complete the following task: {task}"),
                }]),
            ],
        }
    }

    /// Append the per-iteration user turn: instruction text plus the screenshot.
    pub fn push_observation(&mut self, frame: &EncodedFrame) {
        self.messages.push(ChatMessage::user_parts(vec![
            ContentPart::Text {
                text: OBSERVE_PROMPT.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: frame.data_url(),
                },
            },
        ]));
    }

    /// Append the model's reply verbatim, parseable or not.
    pub fn push_assistant(&mut self, reply: &str) {
        self.messages.push(ChatMessage::assistant(reply));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
