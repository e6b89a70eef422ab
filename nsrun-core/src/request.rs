//! Execution requests consumed by the orchestrator

use crate::error::{Error, Result};
use crate::name::NetnsName;

/// Where a command should run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecTarget {
    /// One concrete namespace, addressed by name.
    Named(NetnsName),
    /// Every namespace currently known to the registry.
    All,
}

/// A validated request to execute a command in one or all namespaces.
///
/// Exactly one of "resolves to one concrete namespace" and "iterates all
/// known namespaces" holds for a constructed request; anything else is
/// rejected before any namespace switch can happen.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// Target namespace(s).
    pub target: ExecTarget,
    /// Command and arguments to execute.
    pub command: Vec<String>,
}

impl ExecutionRequest {
    /// Build a request for a single named namespace.
    ///
    /// # Errors
    /// `Error::Usage` if the name or command is missing, `Error::InvalidName`
    /// if the name fails the syntactic check.
    pub fn single(name: Option<&str>, command: Vec<String>) -> Result<Self> {
        let Some(name) = name else {
            return Err(Error::Usage {
                message: "No netns name specified".to_string(),
            });
        };

        let name = NetnsName::new(name)?;

        if command.is_empty() {
            return Err(Error::Usage {
                message: "No command specified".to_string(),
            });
        }

        Ok(Self {
            target: ExecTarget::Named(name),
            command,
        })
    }

    /// Build a broadcast request covering every known namespace.
    ///
    /// # Errors
    /// `Error::Usage` if the command is missing.
    pub fn broadcast(command: Vec<String>) -> Result<Self> {
        if command.is_empty() {
            return Err(Error::Usage {
                message: "No command specified".to_string(),
            });
        }

        Ok(Self {
            target: ExecTarget::All,
            command,
        })
    }

    /// Whether this request iterates all known namespaces.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        matches!(self.target, ExecTarget::All)
    }
}
