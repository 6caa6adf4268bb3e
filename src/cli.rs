//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Vision-driven desktop automation agent.
///
/// Give a task on the command line to run it once, or start without one
/// for an interactive prompt.
#[derive(Parser, Debug)]
#[command(name = "screenpilot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config.toml (otherwise searched next to the binary, in the
    /// working directory and in the user config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Provider id from `[llm.providers]` to use instead of `active_provider`
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Override `execution.max_iterations`
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_iterations: Option<u32>,

    /// Print progress as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Task to run once
    #[arg(num_args = 1.., trailing_var_arg = true)]
    pub task: Vec<String>,
}

impl Cli {
    /// The one-shot task, if any words were given.
    pub fn task(&self) -> Option<String> {
        let task = self.task.join(" ");
        let task = task.trim();
        (!task.is_empty()).then(|| task.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_words_are_joined() {
        let cli = Cli::try_parse_from(["screenpilot", "open", "the", "calculator"]).unwrap();
        assert_eq!(cli.task().as_deref(), Some("open the calculator"));
        assert!(!cli.json);
    }

    #[test]
    fn no_task_means_interactive() {
        let cli = Cli::try_parse_from(["screenpilot", "--json"]).unwrap();
        assert!(cli.task().is_none());
        assert!(cli.json);
    }

    #[test]
    fn overrides() {
        let cli = Cli::try_parse_from([
            "screenpilot",
            "--config",
            "/tmp/c.toml",
            "-p",
            "local",
            "--max-iterations",
            "7",
            "save",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert_eq!(cli.provider.as_deref(), Some("local"));
        assert_eq!(cli.max_iterations, Some(7));
        assert_eq!(cli.task().as_deref(), Some("save"));
    }

    #[test]
    fn zero_iterations_rejected() {
        assert!(Cli::try_parse_from(["screenpilot", "--max-iterations", "0"]).is_err());
    }
}
