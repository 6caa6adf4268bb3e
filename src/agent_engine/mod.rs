pub mod conversation;
pub mod engine;
pub mod events;
pub mod interpreter;
pub mod loop_control;
pub mod state;
