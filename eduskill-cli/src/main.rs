//! EduSkill CLI - Command-line interface
//!
//! Runs the media server and inspects stored videos and playback URLs.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use eduskill_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "eduskill")]
#[command(about = "Media delivery server for the EduSkill learning platform")]
struct Cli {
    /// Console log level
    #[arg(long, value_enum, default_value_t = CliLogLevel::Info, global = true)]
    log_level: CliLogLevel,

    /// Directory for the last-run log file
    #[arg(long, default_value = "logs", global = true)]
    logs_dir: PathBuf,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_tracing_level(), Some(&cli.logs_dir))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    commands::handle_command(cli.command).await?;

    Ok(())
}
