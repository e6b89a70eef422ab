//! Switching the calling process into a named namespace
//!
//! Entry is a point of no return: once `setns` succeeds the process's
//! namespace membership has changed for its lifetime. The mount-side
//! cleanup afterwards (fresh sysfs) is best-effort only.

use nix::mount::{MntFlags, MsFlags, mount, umount2};
use nix::sched::{CloneFlags, setns, unshare};
use tracing::warn;

use nsrun_core::{Error, NetnsName, Result};

use crate::registry::Registry;

/// Move the calling process into the named network namespace.
///
/// # Errors
/// `Error::Namespace` if the pinned file cannot be opened or `setns`
/// fails; the caller must treat this as fatal for the attempting process,
/// which cannot safely continue in an indeterminate namespace state.
pub fn switch_to(registry: &Registry, name: &NetnsName) -> Result<()> {
    let ns_file = registry.open(name)?;

    setns(&ns_file, CloneFlags::CLONE_NEWNET).map_err(|e| Error::Namespace {
        message: format!("setting the network namespace \"{name}\" failed: {e}"),
    })?;

    remount_sysfs();

    Ok(())
}

/// Give the process a private mount namespace with a sysfs matching the
/// namespace just entered. Failures here are logged and tolerated: the
/// namespace membership itself already changed.
fn remount_sysfs() {
    if let Err(e) = unshare(CloneFlags::CLONE_NEWNS) {
        warn!("unshare of mount namespace failed: {e}");
        return;
    }

    // Don't let the sysfs swap propagate back to the parent mount namespace.
    if let Err(e) = mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_SLAVE | MsFlags::MS_REC,
        None::<&str>,
    ) {
        warn!("making / rslave failed: {e}");
        return;
    }

    let _ = umount2("/sys", MntFlags::MNT_DETACH);

    if let Err(e) = mount(
        Some("sysfs"),
        "/sys",
        Some("sysfs"),
        MsFlags::empty(),
        None::<&str>,
    ) {
        warn!("mounting fresh sysfs failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_to_unknown_namespace_fails() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::at(dir.path());
        let name = NetnsName::new("ghost").unwrap();

        let err = switch_to(&registry, &name).unwrap_err();
        assert!(matches!(err, Error::Namespace { .. }));
    }

    #[test]
    fn test_switch_to_plain_file_fails() {
        // A regular file opens fine but setns must reject it.
        let dir = tempfile::tempdir().unwrap();
        std::fs::File::create(dir.path().join("fake")).unwrap();

        let registry = Registry::at(dir.path());
        let name = NetnsName::new("fake").unwrap();
        assert!(switch_to(&registry, &name).is_err());
    }
}
