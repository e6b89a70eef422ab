//! `nsrun identify` - map a process to its registered namespace name

use anyhow::Result;

use nsrun_netns::identity;
use nsrun_netns::registry::Registry;

/// Print the registered namespace name the process belongs to, or nothing
/// when no registered namespace matches.
pub fn execute(pid: Option<u32>, json: bool) -> Result<()> {
    let pid = pid.unwrap_or_else(std::process::id);
    let registry = Registry::new();

    let name = identity::identify(pid, &registry)?;

    if json {
        println!("{}", serde_json::json!({ "pid": pid, "name": name }));
    } else if let Some(name) = name {
        println!("{name}");
    }

    Ok(())
}
