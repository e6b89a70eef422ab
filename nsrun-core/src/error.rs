//! Error types for nsrun

use thiserror::Error;

/// nsrun error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Namespace operation failed
    #[error("Namespace error: {message}")]
    Namespace {
        /// Error message
        message: String,
    },

    /// Netlink operation failed
    #[error("Netlink error: {message}")]
    Netlink {
        /// Error message
        message: String,
    },

    /// Syntactically invalid namespace name
    #[error("Invalid netns name \"{name}\"")]
    InvalidName {
        /// The rejected name
        name: String,
    },

    /// Invalid invocation (missing name or command)
    #[error("{message}")]
    Usage {
        /// Error message
        message: String,
    },

    /// Command execution failed
    #[error("Exec error: {message}")]
    Exec {
        /// Error message
        message: String,
    },

    /// System error from nix
    #[error("System error: {0}")]
    System(#[from] nix::Error),
}

/// Result type alias for nsrun operations
pub type Result<T> = std::result::Result<T, Error>;
