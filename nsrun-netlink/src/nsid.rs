//! NSID capability probe and lookup channel
//!
//! The kernel can optionally assign a small integer id to a network
//! namespace (`RTM_GETNSID`). Support is probed once per process; the
//! terminal answer never changes for the process's lifetime.

use std::fs::File;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd};

use tracing::{debug, warn};

use nsrun_core::{Error, Result};

use crate::rtnl::{NlRequest, RtnlSocket, messages};

/// `RTM_NEWNSID` - namespace id reply/notification
pub const RTM_NEWNSID: u16 = 88;
/// `RTM_GETNSID` - namespace id request
pub const RTM_GETNSID: u16 = 90;

/// Netlink namespace id message attributes (`NETNSA_*`)
pub mod netnsa {
    /// Namespace id (i32)
    pub const NSID: u16 = 1;
    /// Process id (u32)
    pub const PID: u16 = 2;
    /// File descriptor (u32)
    pub const FD: u16 = 3;
}

/// Kernel's "no id assigned" marker.
pub const NSID_NOT_ASSIGNED: i32 = -1;

/// Outcome of the once-per-process NSID capability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NsidState {
    /// No probe has run yet.
    Unprobed,
    /// The kernel rejected `RTM_GETNSID`, or the probe could not run.
    Unsupported,
    /// The kernel answered the probe; id lookups are available.
    Supported,
}

/// The NSID probe state plus the dedicated lookup socket.
///
/// Owned by the orchestrator and threaded down by parameter; the probe runs
/// at most once, and the lookup socket is opened lazily exactly once, only
/// after the capability is confirmed.
#[derive(Debug)]
pub struct NsidChannel {
    state: NsidState,
    sock: Option<RtnlSocket>,
}

impl Default for NsidChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl NsidChannel {
    /// A channel that has not probed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: NsidState::Unprobed,
            sock: None,
        }
    }

    /// Current probe state.
    #[must_use]
    pub const fn state(&self) -> NsidState {
        self.state
    }

    /// Record that the probe cannot run at all, for lack of an rtnetlink
    /// transport. Terminal states never revert: this transitions only out
    /// of `Unprobed`, so a confirmed capability is kept.
    pub fn mark_unsupported(&mut self) {
        if self.state == NsidState::Unprobed {
            self.state = NsidState::Unsupported;
        }
    }

    /// Probe the kernel once and, on support, open the dedicated socket.
    ///
    /// Idempotent: once a terminal state is reached, later calls do nothing.
    /// Every probe-side failure downgrades to `Unsupported` and execution
    /// continues; only failure to open the dedicated socket after support
    /// was confirmed is an error, since id lookups were promised.
    ///
    /// # Errors
    /// `Error::Netlink` if the capability is supported but the lookup
    /// socket cannot be opened.
    pub fn ensure_ready(&mut self, rtnl: &mut RtnlSocket) -> Result<()> {
        if self.state == NsidState::Unprobed {
            self.state = Self::probe(rtnl);
            debug!(state = ?self.state, "nsid capability probed");
        }

        if self.state == NsidState::Supported && self.sock.is_none() {
            match RtnlSocket::open() {
                Ok(sock) => self.sock = Some(sock),
                Err(e) => {
                    return Err(Error::Netlink {
                        message: format!("cannot open nsid control socket: {e}"),
                    });
                }
            }
        }

        Ok(())
    }

    fn probe(rtnl: &mut RtnlSocket) -> NsidState {
        let own_ns = match File::open("/proc/self/ns/net") {
            Ok(file) => file,
            Err(e) => {
                warn!("/proc/self/ns/net: {e}. Continuing anyway.");
                return NsidState::Unsupported;
            }
        };

        let seq = rtnl.next_seq();
        let mut req = NlRequest::new(RTM_GETNSID, libc::NLM_F_REQUEST as u16, seq);
        req.push_attr_u32(netnsa::FD, own_ns.as_raw_fd() as u32);

        if let Err(e) = rtnl.send(&req.finish()) {
            warn!("rtnl_send(RTM_GETNSID): {e}. Continuing anyway.");
            return NsidState::Unsupported;
        }

        let mut buf = vec![0u8; 8192];
        match rtnl.recv(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Self::interpret(&buf)
            }
            Err(e) => {
                // A silent kernel counts as no support; the wait is bounded.
                warn!("rtnl_recv(RTM_GETNSID): {e}. Continuing anyway.");
                NsidState::Unsupported
            }
        }
    }

    /// Classify a probe reply: an error of `EOPNOTSUPP` or `EINVAL` means
    /// the kernel cannot report namespace ids, anything else means it can.
    fn interpret(reply: &[u8]) -> NsidState {
        for msg in messages(reply) {
            if let Some(code) = msg.error_code() {
                if code == -libc::EOPNOTSUPP || code == -libc::EINVAL {
                    return NsidState::Unsupported;
                }
            }
            return NsidState::Supported;
        }
        NsidState::Unsupported
    }

    /// Look up the namespace id behind an open namespace file descriptor.
    ///
    /// Returns `Ok(None)` when the capability is unsupported or the kernel
    /// has not assigned an id to this namespace.
    ///
    /// # Errors
    /// `Error::Netlink` if a lookup round trip fails outright.
    pub fn nsid_for(&mut self, ns: BorrowedFd<'_>) -> Result<Option<i32>> {
        let Some(sock) = self.sock.as_mut() else {
            return Ok(None);
        };

        let seq = sock.next_seq();
        let mut req = NlRequest::new(RTM_GETNSID, libc::NLM_F_REQUEST as u16, seq);
        req.push_attr_u32(netnsa::FD, ns.as_fd().as_raw_fd() as u32);

        let reply = sock.request(req)?;
        for msg in messages(&reply) {
            if let Some(code) = msg.error_code() {
                return Err(Error::Netlink {
                    message: format!(
                        "RTM_GETNSID: {}",
                        std::io::Error::from_raw_os_error(-code)
                    ),
                });
            }
            if msg.msg_type == RTM_NEWNSID {
                // Attributes follow the 4-byte padded rtgenmsg header.
                for (kind, payload) in msg.attrs(1) {
                    if kind == netnsa::NSID && payload.len() >= 4 {
                        let mut raw = [0u8; 4];
                        raw.copy_from_slice(&payload[..4]);
                        let id = i32::from_ne_bytes(raw);
                        return Ok((id != NSID_NOT_ASSIGNED).then_some(id));
                    }
                }
            }
        }
        Ok(None)
    }
}
