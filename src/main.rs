use clap::Parser;

use screenpilot::cli::Cli;

#[tokio::main]
async fn main() {
    screenpilot::init_tracing();
    let cli = Cli::parse();

    if let Err(e) = screenpilot::run(cli).await {
        tracing::error!(error = %e, "screenpilot exited with an error");
        std::process::exit(1);
    }
}
