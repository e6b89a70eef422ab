//! VRF association cleanup
//!
//! VRF binding is implemented as membership in a `vrf/<name>` cgroup
//! subtree and is scoped to a namespace; it must not leak across a
//! namespace switch. Reset is best-effort: a host without VRF support is
//! the common case.

use std::fs;
use std::io;

use tracing::{debug, warn};

/// Clear any VRF association inherited from the namespace being left.
///
/// Never fails: every problem is logged and swallowed.
pub fn reset() {
    match try_reset() {
        Ok(Some(cgroup)) => debug!(cgroup, "left vrf cgroup"),
        Ok(None) => {}
        Err(e) => warn!("vrf reset: {e}. Continuing anyway."),
    }
}

fn try_reset() -> io::Result<Option<String>> {
    let cgroups = fs::read_to_string("/proc/self/cgroup")?;

    // cgroup2 entry: "0::<path>"
    let Some(path) = cgroups
        .lines()
        .find_map(|line| line.strip_prefix("0::"))
    else {
        return Ok(None);
    };

    let Some(pos) = path.find("/vrf/") else {
        return Ok(None);
    };

    // Rejoin the nearest ancestor above the vrf subtree.
    let parent = &path[..pos];
    let procs = format!("/sys/fs/cgroup{parent}/cgroup.procs");
    fs::write(&procs, std::process::id().to_string())?;
    Ok(Some(path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_is_a_noop_outside_vrf() {
        // Test processes are not in a vrf cgroup; reset must do nothing
        // and must not panic or error.
        reset();
    }
}
