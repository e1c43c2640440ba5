mod assembly;
mod cli;
mod commands;
mod delivery;
mod error;
mod mcp;
mod page_range;
mod pdf;
mod planner;
mod progress;
mod range_set;
mod session;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use progress::Pacing;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout belongs to the MCP transport, so logs go to stderr
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let pacing = Pacing::from_millis(cli.step_delay_ms);

    match cli.command {
        Commands::Mcp => {
            mcp::run_server(pacing).await?;
        }
        Commands::Info { path } => {
            commands::info::run(&path)?;
        }
        Commands::Split {
            path,
            ranges,
            output_dir,
            merge,
            order,
        } => {
            let options = commands::split::SplitOptions {
                ranges,
                output_dir,
                merge,
                order,
            };
            commands::split::run(&path, &options, pacing).await?;
        }
        Commands::Merge { inputs, output } => {
            commands::merge::run(inputs.as_slice(), &output, pacing).await?;
        }
    }

    Ok(())
}
