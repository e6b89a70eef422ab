//! `nsrun list` - registered namespaces with their kernel ids

use std::os::fd::AsFd;

use anyhow::Result;
use serde::Serialize;
use tracing::warn;

use nsrun_core::NetnsName;
use nsrun_netlink::{NsidChannel, RtnlSocket};
use nsrun_netns::registry::Registry;

#[derive(Serialize)]
struct NetnsEntry {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    nsid: Option<i32>,
}

/// Print every registered namespace, with `(id: N)` where the kernel has
/// assigned a namespace id and can report it.
pub fn execute(json: bool) -> Result<()> {
    let registry = Registry::new();

    let mut channel = NsidChannel::new();
    match RtnlSocket::open() {
        Ok(mut rtnl) => channel.ensure_ready(&mut rtnl)?,
        Err(e) => warn!("{e}. Continuing without nsid support."),
    }

    let mut entries = Vec::new();
    for name in registry.list()? {
        let nsid = NetnsName::new(name.as_str()).ok().and_then(|parsed| {
            let file = registry.open(&parsed).ok()?;
            channel.nsid_for(file.as_fd()).ok().flatten()
        });
        entries.push(NetnsEntry { name, nsid });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in entries {
            match entry.nsid {
                Some(id) => println!("{} (id: {id})", entry.name),
                None => println!("{}", entry.name),
            }
        }
    }

    Ok(())
}
