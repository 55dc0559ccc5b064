mod asset;
mod commands;
mod config;
mod environment;
mod error;
mod logger;
mod runner;

use crate::commands::Commands;
use crate::error::Error;
use crate::runner::{Runnable, Runner};
use clap::Parser;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Derive a runner from the command and run it
async fn run(command: impl Runnable) {
    let run = command.runner().run().await;

    if run.is_err() {
        println!("Error\n{}", run.unwrap_err())
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::Logger::init();
    let cli = Cli::parse();

    // Match all commands here, in one place
    Ok(match cli.command {
        Commands::Synth(cmd) => run(cmd).await,
        Commands::Deploy(cmd) => run(cmd).await,
        Commands::Destroy(cmd) => run(cmd).await,
        Commands::Status(cmd) => run(cmd).await,
    })
}
