mod commands;
pub mod pipeline;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use commands::{AnalyzeArgs, VisionArgs, WatchArgs};
pub use pipeline::{analyze_frame, AnalysisResult, Pipeline};

#[derive(Parser)]
#[command(name = "set-finder")]
#[command(about = "Find a Set on a screenshot of a 12-card Set board")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one screenshot and print the cards and the Set found.
    Analyze(AnalyzeArgs),

    /// Re-analyze a screenshot file on an interval.
    Watch(WatchArgs),
}

pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "set_finder=debug,set_vision=debug,set_capture=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze(args) => commands::analyze(&args),
        Command::Watch(args) => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(commands::watch(args))
        }
    }
}
