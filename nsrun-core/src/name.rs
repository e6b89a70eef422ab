//! Validated network-namespace names
//!
//! Namespace names are entries in the netns registry directory; they must be
//! usable as a single path component.

use serde::Serialize;
use std::fmt;

use crate::error::{Error, Result};

/// Maximum length of a namespace name in bytes (NAME_MAX).
pub const NAME_MAX: usize = 255;

/// A syntactically valid network-namespace name.
///
/// Validation happens at construction; a held value is always usable as a
/// registry directory entry. Names are only links: two names may reference
/// the same namespace, so equality of names says nothing about equality of
/// namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NetnsName(String);

impl NetnsName {
    /// Validate and wrap a namespace name.
    ///
    /// # Errors
    /// Returns `Error::InvalidName` if the name is empty, longer than
    /// `NAME_MAX` bytes, contains a `/`, or is `.` or `..`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        if name.is_empty()
            || name.len() > NAME_MAX
            || name.contains('/')
            || name == "."
            || name == ".."
        {
            return Err(Error::InvalidName { name });
        }

        Ok(Self(name))
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetnsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NetnsName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for NetnsName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
