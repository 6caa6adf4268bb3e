pub mod agent_engine;
pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod executor;
pub mod llm;
pub mod perception;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use crate::agent_engine::engine::AgentEngine;
use crate::agent_engine::events::ConsoleSink;
use crate::cli::Cli;
use crate::errors::{PilotError, PilotResult};
use crate::executor::native::NativeDesktop;
use crate::llm::registry::ProviderRegistry;

/// Logs go to stderr so stdout carries only operator output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

pub async fn run(cli: Cli) -> PilotResult<()> {
    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    let config = config::load_config(cli.config.as_deref())?;

    let mut registry = ProviderRegistry::from_config(&config.llm);
    if let Some(id) = &cli.provider {
        registry.set_active(id.clone())?;
    }
    let (provider, call_cfg) = registry.active()?;
    tracing::info!(
        provider = %provider.name(),
        display_name = %registry.active_display_name(),
        model = %call_cfg.model,
        "provider selected"
    );

    let mut execution = config.execution.clone();
    if let Some(max) = cli.max_iterations {
        execution.max_iterations = max;
    }

    let desktop = Arc::new(NativeDesktop::new()?);
    let sink = Arc::new(ConsoleSink::new(cli.json));
    let mut engine = AgentEngine::new(
        desktop,
        provider,
        call_cfg,
        execution,
        config.screenshot.clone(),
        sink,
    );

    if let Some(path) = &config.prompts.system_file {
        let prompt = std::fs::read_to_string(path).map_err(|e| {
            PilotError::Config(format!("cannot read system prompt {}: {e}", path.display()))
        })?;
        tracing::info!(path = %path.display(), "custom system prompt loaded");
        engine = engine.with_system_prompt(prompt);
    }

    match cli.task() {
        Some(task) => commands::run_once(&engine, &task).await.map(|_| ()),
        None => commands::repl(&engine).await,
    }
}
