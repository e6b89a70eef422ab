//! nsrun core - foundation types shared by the nsrun crates
//!
//! This crate provides the error taxonomy, validated namespace names, and
//! the execution request consumed by the orchestrator.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod name;
pub mod request;

pub use error::{Error, Result};
pub use name::NetnsName;
pub use request::{ExecTarget, ExecutionRequest};
