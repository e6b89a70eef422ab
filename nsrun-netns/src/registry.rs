//! The named-namespace registry directory
//!
//! `ip netns add` pins namespaces as bind mounts under a well-known
//! directory; the entry names are the namespace names. Names are links
//! only: a namespace may carry several names, or none.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use nsrun_core::{Error, NetnsName, Result};

/// The runtime directory where named network namespaces are stored.
pub const NETNS_RUN_DIR: &str = "/var/run/netns";

/// Handle on a namespace registry directory.
///
/// The directory may not exist; that reads as "no namespaces are
/// registered", never as an error.
#[derive(Debug, Clone)]
pub struct Registry {
    dir: PathBuf,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// The system registry at [`NETNS_RUN_DIR`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: PathBuf::from(NETNS_RUN_DIR),
        }
    }

    /// A registry rooted at an arbitrary directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The registry directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a named namespace's pinned file.
    #[must_use]
    pub fn path(&self, name: &NetnsName) -> PathBuf {
        self.dir.join(name.as_str())
    }

    /// Names of all registered namespaces, in directory order.
    ///
    /// A missing registry directory yields an empty list.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::Namespace {
                    message: format!("Failed to open directory {}: {e}", self.dir.display()),
                });
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::Namespace {
                message: format!("Failed to read directory {}: {e}", self.dir.display()),
            })?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    /// Open a named namespace's pinned file.
    pub fn open(&self, name: &NetnsName) -> Result<File> {
        let path = self.path(name);
        File::open(&path).map_err(|e| Error::Namespace {
            message: format!("Cannot open network namespace \"{name}\": {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_lists_empty() {
        let registry = Registry::at("/nonexistent/netns/dir");
        assert_eq!(registry.list().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_list_returns_entry_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::File::create(dir.path().join("red")).unwrap();
        std::fs::File::create(dir.path().join("blue")).unwrap();

        let registry = Registry::at(dir.path());
        let mut names = registry.list().unwrap();
        names.sort();
        assert_eq!(names, vec!["blue", "red"]);
    }

    #[test]
    fn test_path_joins_name() {
        let registry = Registry::at("/var/run/netns");
        let name = NetnsName::new("red").unwrap();
        assert_eq!(registry.path(&name), PathBuf::from("/var/run/netns/red"));
    }

    #[test]
    fn test_open_missing_namespace_fails() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::at(dir.path());
        let name = NetnsName::new("ghost").unwrap();
        assert!(registry.open(&name).is_err());
    }
}
