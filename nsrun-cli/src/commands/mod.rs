//! Subcommand implementations

pub mod exec;
pub mod identify;
pub mod list;
