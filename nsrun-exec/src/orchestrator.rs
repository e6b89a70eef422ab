//! Top-level switch-and-exec flow

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, error, warn};

use nsrun_core::{ExecTarget, ExecutionRequest, NetnsName, Result};
use nsrun_netlink::{NsidChannel, NsidState, RtnlSocket};
use nsrun_netns::registry::Registry;
use nsrun_netns::snapshot::{InterfaceSnapshot, SnapshotHandle};
use nsrun_netns::{switch, vrf};

use crate::command::run_command;

/// Orchestrates namespace-switched command execution.
///
/// Owns the process-wide NSID probe state and the pre-switch interface
/// snapshot; both are set up once per [`run`](Self::run) flow, before any
/// fork or namespace switch.
#[derive(Debug)]
pub struct Orchestrator {
    registry: Registry,
    nsid: NsidChannel,
    snapshot: Option<SnapshotHandle>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    /// Orchestrator over the system registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(Registry::new())
    }

    /// Orchestrator over an arbitrary registry directory.
    #[must_use]
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            registry,
            nsid: NsidChannel::new(),
            snapshot: None,
        }
    }

    /// The interface snapshot captured by the last [`run`](Self::run),
    /// still valid after any namespace switch.
    #[must_use]
    pub fn snapshot(&self) -> Option<&SnapshotHandle> {
        self.snapshot.as_ref()
    }

    /// Execute a validated request and return the caller-visible status.
    ///
    /// Single target: the child's exit code, unchanged. Broadcast: every
    /// known namespace is attempted independently and in registry order;
    /// individual failures are log-only and the result is the fixed
    /// success indicator 0.
    pub fn run(&mut self, request: &ExecutionRequest) -> Result<i32> {
        self.run_with_output(request, &mut std::io::stdout())
    }

    /// Like [`run`](Self::run), with the broadcast announcements written
    /// to `out` instead of stdout.
    pub fn run_with_output<W: Write>(
        &mut self,
        request: &ExecutionRequest,
        out: &mut W,
    ) -> Result<i32> {
        self.init_nsid_channel()?;

        // Capture before any fork or switch; children inherit the handle.
        let snapshot = InterfaceSnapshot::capture();
        self.snapshot = Some(Arc::clone(&snapshot));

        match &request.target {
            ExecTarget::All => {
                for entry in self.registry.list()? {
                    // Announced before the attempt; this line is the only
                    // stdout artifact of broadcast mode.
                    writeln!(out, "\nnetns: {entry}")?;
                    match NetnsName::new(entry.as_str()) {
                        Ok(name) => {
                            match self.switch_and_exec(&name, &request.command, &snapshot) {
                                Ok(0) => {}
                                Ok(status) => {
                                    warn!(netns = %name, status, "command failed");
                                }
                                Err(e) => error!(netns = %name, "exec failed: {e}"),
                            }
                        }
                        Err(e) => error!("skipping registry entry: {e}"),
                    }
                }
                Ok(0)
            }
            ExecTarget::Named(name) => self.switch_and_exec(name, &request.command, &snapshot),
        }
    }

    /// Probe the NSID capability once per process.
    ///
    /// Not being able to open the shared rtnetlink socket downgrades the
    /// capability to unsupported; only a failed control-socket open after
    /// confirmed support is fatal.
    fn init_nsid_channel(&mut self) -> Result<()> {
        // Terminal probe state: the first call already settled the
        // control socket too.
        if self.nsid.state() != NsidState::Unprobed {
            return Ok(());
        }

        match RtnlSocket::open() {
            Ok(mut rtnl) => self.nsid.ensure_ready(&mut rtnl),
            Err(e) => {
                // No transport, no probe: the capability settles as
                // unsupported and is never re-attempted.
                self.nsid.mark_unsupported();
                warn!("{e}. Continuing without nsid support.");
                Ok(())
            }
        }
    }

    /// Current NSID capability state, settled by the first
    /// [`run`](Self::run).
    #[must_use]
    pub fn nsid_state(&self) -> NsidState {
        self.nsid.state()
    }

    /// One fork/switch/exec attempt.
    ///
    /// The pre-exec hook runs in the forked child: clear the VRF
    /// association inherited from the namespace being left, then enter the
    /// target namespace. A failed entry is fatal to that child only.
    fn switch_and_exec(
        &self,
        name: &NetnsName,
        argv: &[String],
        snapshot: &SnapshotHandle,
    ) -> Result<i32> {
        let registry = self.registry.clone();
        let name = name.clone();
        let snapshot = Arc::clone(snapshot);

        run_command(argv, move || {
            vrf::reset();
            switch::switch_to(&registry, &name)?;
            debug!(
                netns = %name,
                pre_switch_interfaces = snapshot.len(),
                "entered namespace"
            );
            Ok(())
        })
    }
}
