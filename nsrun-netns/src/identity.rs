//! Namespace identity resolution
//!
//! A namespace file's (device, inode) pair is the only reliable equality
//! key; names are just links in the registry directory. Resolving "which
//! namespace is process P in" means comparing `/proc/<pid>/ns/net` against
//! every registry entry by identity.

use std::fs::File;
use std::io;
use std::os::unix::fs::MetadataExt;

use serde::Serialize;
use tracing::debug;

use nsrun_core::{Error, Result};

use crate::registry::Registry;

/// (device, inode) identity of a network-namespace file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NsIdentity {
    /// Device id of the nsfs instance.
    pub dev: u64,
    /// Inode number of the namespace.
    pub ino: u64,
}

impl NsIdentity {
    /// Identity of the network namespace process `pid` is a member of.
    ///
    /// # Errors
    /// `Error::Namespace` if `/proc/<pid>/ns/net` cannot be opened or
    /// stat'ed; the process may not exist or permission may be lacking.
    pub fn of_pid(pid: u32) -> Result<Self> {
        let path = format!("/proc/{pid}/ns/net");
        let file = File::open(&path).map_err(|e| Error::Namespace {
            message: format!("Cannot open network namespace: {e}"),
        })?;
        let meta = file.metadata().map_err(|e| Error::Namespace {
            message: format!("Stat of netns failed: {e}"),
        })?;
        Ok(Self {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }
}

/// Map a process id to the registered namespace name it lives in.
///
/// Walks the registry and returns the first entry whose pinned file has the
/// same (device, inode) identity as the process's namespace. `Ok(None)`
/// means no registered name matches; a missing registry directory reads
/// the same way.
///
/// # Errors
/// Only failures on the target process's own namespace file are errors;
/// unreadable individual registry entries are skipped.
pub fn identify(pid: u32, registry: &Registry) -> Result<Option<String>> {
    let target = NsIdentity::of_pid(pid)?;

    let entries = match std::fs::read_dir(registry.dir()) {
        Ok(entries) => entries,
        // A missing directory is an empty registry.
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(Error::Namespace {
                message: format!(
                    "Failed to open directory {}: {e}",
                    registry.dir().display()
                ),
            });
        }
    };

    for entry in entries {
        let Ok(entry) = entry else { continue };
        let Ok(meta) = std::fs::metadata(entry.path()) else {
            continue;
        };

        if meta.dev() == target.dev && meta.ino() == target.ino {
            let name = entry.file_name().to_string_lossy().into_owned();
            debug!(pid, name, "namespace identified");
            return Ok(Some(name));
        }
    }

    Ok(None)
}
