use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::agent_engine::engine::AgentEngine;
use crate::agent_engine::state::TaskOutcome;
use crate::errors::PilotResult;

const PROMPT: &str = "Enter task (or 'quit' to exit): ";

/// One line of operator input.
#[derive(Debug, PartialEq, Eq)]
pub enum OperatorCommand {
    Quit,
    Empty,
    Task(String),
}

pub fn parse_input(line: &str) -> OperatorCommand {
    let line = line.trim();
    if line.is_empty() {
        return OperatorCommand::Empty;
    }
    match line.to_lowercase().as_str() {
        "quit" | "exit" | "q" => OperatorCommand::Quit,
        _ => OperatorCommand::Task(line.to_string()),
    }
}

/// Run a single task. Errors are returned unreported; the caller decides
/// how to surface them.
pub async fn run_once(engine: &AgentEngine, task: &str) -> PilotResult<TaskOutcome> {
    let outcome = engine.run_task(task).await?;
    if !outcome.is_completed() {
        tracing::warn!(iterations = outcome.iterations, "task did not complete");
    }
    Ok(outcome)
}

/// Read tasks from stdin until `quit` or end of input.
/// A failed task does not end the session.
pub async fn repl(engine: &AgentEngine) -> PilotResult<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{PROMPT}");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        match parse_input(&line) {
            OperatorCommand::Quit => break,
            OperatorCommand::Empty => continue,
            OperatorCommand::Task(task) => {
                if let Err(e) = run_once(engine, &task).await {
                    eprintln!("Error: {e}");
                }
            }
        }
    }
    tracing::info!("session ended");
    Ok(())
}
