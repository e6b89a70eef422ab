//! Switch-and-exec orchestration
//!
//! The entry point of nsrun's execution flow: validate a request, probe the
//! NSID capability once, snapshot interfaces before any switch, then fork,
//! switch namespaces, and exec the user's command - once for a single
//! target, or once per known namespace in broadcast mode.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod command;
pub mod orchestrator;

pub use command::run_command;
pub use orchestrator::Orchestrator;
