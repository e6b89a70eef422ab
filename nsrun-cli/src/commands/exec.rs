//! `nsrun exec` - switch namespace and execute

use anyhow::Result;

use nsrun_core::ExecutionRequest;
use nsrun_exec::Orchestrator;

/// Build the execution request and run it; the returned status becomes the
/// process exit code.
pub fn execute(all: bool, mut args: Vec<String>) -> Result<i32> {
    let request = if all {
        ExecutionRequest::broadcast(args)?
    } else {
        let name = if args.is_empty() {
            None
        } else {
            Some(args.remove(0))
        };
        ExecutionRequest::single(name.as_deref(), args)?
    };

    let mut orchestrator = Orchestrator::new();
    Ok(orchestrator.run(&request)?)
}
