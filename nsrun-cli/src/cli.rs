//! CLI argument definitions

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nsrun")]
#[command(about = "Run commands in Linux network namespaces", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a command inside a network namespace
    Exec {
        /// Run the command once in every registered namespace
        #[arg(short, long)]
        all: bool,

        /// Namespace name (unless --all) followed by the command to run
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },

    /// Report which registered namespace a process belongs to
    Identify {
        /// Process id (default: current process)
        #[arg(short, long)]
        pid: Option<u32>,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// List registered namespaces
    List {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
}
