//! nsrun - run commands in Linux network namespaces
//!
//! A small iproute2-style utility: execute a command in one named network
//! namespace (or in all of them), identify which namespace a process is
//! in, and list the registered namespaces with their kernel-assigned ids.

use clap::Parser;
use std::process;
use tracing::Level;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Exec { all, args } => commands::exec::execute(all, args),
        Commands::Identify { pid, json } => commands::identify::execute(pid, json).map(|()| 0),
        Commands::List { json } => commands::list::execute(json).map(|()| 0),
    };

    match result {
        Ok(status) => process::exit(status),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
