//! rtnetlink transport and NSID capability probing
//!
//! This crate carries the netlink side of nsrun: a small request/response
//! socket over `NETLINK_ROUTE`, and the once-per-process probe that decides
//! whether the kernel can report namespace ids (`RTM_GETNSID`).

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod nsid;
pub mod rtnl;

pub use nsid::{NsidChannel, NsidState};
pub use rtnl::{NlMessage, NlRequest, RtnlSocket};
