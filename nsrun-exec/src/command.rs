//! Fork/exec spawn primitive
//!
//! This module uses `unsafe` for fork() which is inherently unsafe but
//! necessary: the pre-exec hook must run in the process that will become
//! the namespace member, after fork and before exec.

#![allow(unsafe_code)]

use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, execvp, fork};
use std::ffi::CString;
use tracing::{debug, warn};

use nsrun_core::{Error, Result};

/// Fork, run `pre_exec` in the child, then exec `command`.
///
/// The parent waits and returns the child's exit code unchanged; a child
/// killed by a signal maps to 128 + signal number. In the child, a failing
/// pre-exec hook is fatal (exit 1) because the process may be in an
/// indeterminate namespace state; a failing exec exits 127.
pub fn run_command<F>(command: &[String], pre_exec: F) -> Result<i32>
where
    F: FnOnce() -> Result<()>,
{
    if command.is_empty() {
        return Err(Error::Usage {
            message: "No command specified".to_string(),
        });
    }

    debug!(command = ?command, "spawning command");

    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => wait_for(child),
        Ok(ForkResult::Child) => {
            // If exec fails we exit here - never return to the Rust runtime.
            child_process(command, pre_exec);
        }
        Err(e) => Err(Error::Exec {
            message: format!("Fork failed: {e}"),
        }),
    }
}

/// Parent side: wait for the child to finish.
fn wait_for(child: Pid) -> Result<i32> {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, exit_code)) => {
                debug!(exit_code, "child exited");
                return Ok(exit_code);
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                warn!("child terminated by signal: {signal:?}");
                return Ok(128 + signal as i32);
            }
            Ok(status) => {
                debug!("child status: {status:?}");
            }
            Err(nix::errno::Errno::EINTR) => {}
            Err(nix::errno::Errno::ECHILD) => {
                warn!("child process no longer exists");
                return Ok(0);
            }
            Err(e) => {
                return Err(Error::Exec {
                    message: format!("Wait failed: {e}"),
                });
            }
        }
    }
}

/// Child side: run the hook, then exec. Never returns.
fn child_process<F>(command: &[String], pre_exec: F) -> !
where
    F: FnOnce() -> Result<()>,
{
    if let Err(e) = pre_exec() {
        eprintln!("nsrun: {e}");
        std::process::exit(1);
    }

    let argv: Vec<CString> = match command
        .iter()
        .map(|arg| CString::new(arg.as_bytes()))
        .collect()
    {
        Ok(argv) => argv,
        Err(e) => {
            eprintln!("nsrun: invalid argument: {e}");
            std::process::exit(127);
        }
    };

    // Replaces this process on success.
    let err = execvp(&argv[0], &argv);
    eprintln!("nsrun: exec of {} failed: {:?}", command[0], err);
    std::process::exit(127);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_empty_command_rejected() {
        let err = run_command(&[], || Ok(())).unwrap_err();
        assert!(matches!(err, Error::Usage { .. }));
    }

    #[test]
    fn test_successful_command() {
        let status = run_command(&cmd(&["true"]), || Ok(())).unwrap();
        assert_eq!(status, 0);
    }

    #[test]
    fn test_exit_code_passed_through_unchanged() {
        let status = run_command(&cmd(&["false"]), || Ok(())).unwrap();
        assert_eq!(status, 1);

        let status = run_command(&cmd(&["sh", "-c", "exit 7"]), || Ok(())).unwrap();
        assert_eq!(status, 7);
    }

    #[test]
    fn test_missing_binary_exits_127() {
        let status = run_command(&cmd(&["/nonexistent/binary"]), || Ok(())).unwrap();
        assert_eq!(status, 127);
    }

    #[test]
    fn test_failing_pre_exec_hook_is_fatal_to_child() {
        let status = run_command(&cmd(&["true"]), || {
            Err(Error::Namespace {
                message: "no such namespace".to_string(),
            })
        })
        .unwrap();
        assert_eq!(status, 1);
    }
}
