//! Marquee CLI - Command-line interface
//!
//! Runs the stream resolution server and provides a terminal client for
//! it.

mod commands;

use clap::Parser;

#[derive(Parser)]
#[command(name = "marquee")]
#[command(about = "A catalog stream resolution server and client")]
struct Cli {
    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    commands::handle_command(cli.command).await?;

    Ok(())
}
