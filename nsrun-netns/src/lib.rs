//! Filesystem-side network-namespace machinery
//!
//! This crate covers everything nsrun does with namespaces below netlink:
//! - the registry of named namespaces under `/var/run/netns`
//! - namespace identity resolution by (device, inode) comparison
//! - switching the calling process into a named namespace
//! - clearing VRF association before a switch
//! - the pre-switch interface snapshot

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod identity;
pub mod registry;
pub mod snapshot;
pub mod switch;
pub mod vrf;

pub use identity::{NsIdentity, identify};
pub use registry::{NETNS_RUN_DIR, Registry};
pub use snapshot::{InterfaceEntry, InterfaceSnapshot, MAX_INTERFACES, SnapshotHandle};
pub use switch::switch_to;
