use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{PilotError, PilotResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub screenshot: ScreenshotConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmConfig {
    pub active_provider: String,
    #[serde(default)]
    pub providers: HashMap<String, ProviderEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub display_name: String,
    /// Full chat-completions endpoint, e.g. `https://api.openai.com/v1/chat/completions`.
    pub api_base: String,
    /// Vision-capable model sent with every request.
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Use SSE streaming for replies.
    #[serde(default)]
    pub stream: bool,
    /// Optional API key stored in config.toml (overridden by env var SCREENPILOT_<ID>_API_KEY).
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_temperature() -> f64 {
    0.1
}

fn default_max_tokens() -> u32 {
    1000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Seconds to let the UI settle after a device action.
    #[serde(default = "default_action_delay")]
    pub delay_between_actions: f64,
    /// Seconds to pause between loop iterations.
    #[serde(default = "default_loop_delay")]
    pub delay_between_loops: f64,
    /// Refuse device actions while the pointer sits in a screen corner.
    #[serde(default = "default_true")]
    pub failsafe: bool,
    /// Wheel notches per unit of a model-supplied scroll amount.
    #[serde(default = "default_scroll_step")]
    pub scroll_step: i32,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            delay_between_actions: default_action_delay(),
            delay_between_loops: default_loop_delay(),
            failsafe: true,
            scroll_step: default_scroll_step(),
        }
    }
}

fn default_max_iterations() -> u32 {
    30
}

fn default_action_delay() -> f64 {
    0.1
}

fn default_loop_delay() -> f64 {
    1.0
}

fn default_scroll_step() -> i32 {
    3
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotConfig {
    #[serde(default)]
    pub format: ImageFormat,
    /// JPEG quality 1–100; ignored for PNG.
    #[serde(default = "default_quality")]
    pub quality: u8,
    /// Downscale frames wider than this before encoding.
    #[serde(default)]
    pub max_width: Option<u32>,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            quality: default_quality(),
            max_width: None,
        }
    }
}

fn default_quality() -> u8 {
    85
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptsConfig {
    /// Replaces the built-in system prompt when set.
    #[serde(default)]
    pub system_file: Option<PathBuf>,
}

fn resolve_config_path(explicit: Option<&Path>) -> PilotResult<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(PilotError::Config(format!(
            "config file {} does not exist",
            path.display()
        )));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    if let Some(dir) = dirs::config_dir() {
        let candidate = dir.join("screenpilot").join("config.toml");
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found in user config dir");
            return Ok(candidate);
        }
    }

    Err(PilotError::Config(
        "config.toml not found next to executable, in working directory or user config dir".into(),
    ))
}

pub fn parse_config(content: &str) -> PilotResult<AppConfig> {
    let config: AppConfig = toml::from_str(content)?;
    if config.execution.max_iterations == 0 {
        return Err(PilotError::Config("execution.max_iterations must be at least 1".into()));
    }
    if !(1..=100).contains(&config.screenshot.quality) {
        return Err(PilotError::Config(format!(
            "screenshot.quality must be within 1..=100, got {}",
            config.screenshot.quality
        )));
    }
    for (name, secs) in [
        ("delay_between_actions", config.execution.delay_between_actions),
        ("delay_between_loops", config.execution.delay_between_loops),
    ] {
        if !secs.is_finite() || secs < 0.0 {
            return Err(PilotError::Config(format!(
                "execution.{name} must be a non-negative number of seconds"
            )));
        }
    }
    Ok(config)
}

pub fn load_config(explicit: Option<&Path>) -> PilotResult<AppConfig> {
    let path = resolve_config_path(explicit)?;
    let content = std::fs::read_to_string(&path)?;
    let config = parse_config(&content)?;
    tracing::info!(path = %path.display(), provider = %config.llm.active_provider, "config loaded");
    Ok(config)
}
