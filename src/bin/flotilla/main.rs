//! Flotilla CLI - converts a flat module tree into a multi-package workspace

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("flotilla=debug")
    } else {
        EnvFilter::new("flotilla=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let color = !cli.no_color;

    // Execute command
    match cli.command {
        Commands::Convert(args) => commands::convert::execute(args, color),
        Commands::Exports(args) => commands::exports::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
