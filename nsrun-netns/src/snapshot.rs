//! Pre-switch interface snapshot
//!
//! Switching namespaces replaces the process's view of interfaces, so the
//! set visible before a switch has to be captured first. The snapshot is
//! immutable after capture and handed to forked children through an `Arc`;
//! the child inherits the parent's address space at fork time, so the
//! pre-switch table survives the switch without any shared-memory segment.
//! Single writer before fork, many readers after.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

/// Capacity of the snapshot table; interfaces beyond it are dropped.
pub const MAX_INTERFACES: usize = 1024;

/// One captured (index, name) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceEntry {
    /// Interface index.
    pub index: u32,
    /// Interface name.
    pub name: String,
}

/// Fixed-capacity table of the interfaces visible at capture time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InterfaceSnapshot {
    entries: Vec<InterfaceEntry>,
}

/// Read-only handle shared with forked children.
pub type SnapshotHandle = Arc<InterfaceSnapshot>;

impl InterfaceSnapshot {
    /// Capture the currently visible interfaces.
    ///
    /// Never fails: if enumeration is impossible the snapshot is empty and
    /// interface reporting degrades, but namespace switching proceeds.
    #[must_use]
    pub fn capture() -> SnapshotHandle {
        match nix::net::if_::if_nameindex() {
            Ok(interfaces) => {
                let snapshot = Self::collect(interfaces.iter().map(|i| {
                    (i.index(), i.name().to_string_lossy().into_owned())
                }));
                debug!(interfaces = snapshot.len(), "interface snapshot captured");
                Arc::new(snapshot)
            }
            Err(e) => {
                warn!("if_nameindex: {e}. Continuing with an empty snapshot.");
                Arc::new(Self::default())
            }
        }
    }

    /// Build a snapshot from (index, name) pairs, enforcing the capacity
    /// bound and index uniqueness.
    pub fn collect<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, String)>,
    {
        let mut entries: Vec<InterfaceEntry> = Vec::new();
        for (index, name) in pairs {
            if entries.len() >= MAX_INTERFACES {
                warn!(
                    capacity = MAX_INTERFACES,
                    "interface snapshot full, dropping remaining interfaces"
                );
                break;
            }
            if entries.iter().any(|e| e.index == index) {
                continue;
            }
            entries.push(InterfaceEntry { index, name });
        }
        Self { entries }
    }

    /// Name recorded for an interface index, if any.
    #[must_use]
    pub fn name_of(&self, index: u32) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.index == index)
            .map(|e| e.name.as_str())
    }

    /// Number of captured interfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The captured entries, in enumeration order.
    #[must_use]
    pub fn entries(&self) -> &[InterfaceEntry] {
        &self.entries
    }
}
