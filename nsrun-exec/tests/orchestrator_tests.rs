use nsrun_core::ExecutionRequest;
use nsrun_exec::Orchestrator;
use nsrun_netns::registry::Registry;

fn cmd(parts: &[&str]) -> Vec<String> {
    parts.iter().map(ToString::to_string).collect()
}

#[test]
fn test_broadcast_over_empty_registry_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let mut orchestrator = Orchestrator::with_registry(Registry::at(dir.path()));

    let request = ExecutionRequest::broadcast(cmd(&["echo", "hi"])).unwrap();
    assert_eq!(orchestrator.run(&request).unwrap(), 0);
}

#[test]
fn test_broadcast_over_missing_registry_succeeds() {
    let mut orchestrator = Orchestrator::with_registry(Registry::at("/nonexistent/netns/dir"));

    let request = ExecutionRequest::broadcast(cmd(&["echo", "hi"])).unwrap();
    assert_eq!(orchestrator.run(&request).unwrap(), 0);
}

#[test]
fn test_broadcast_reports_fixed_success_despite_failures() {
    // Plain files are listed as namespaces but cannot be entered; every
    // attempt fails in its child, the loop still completes and reports
    // the fixed success indicator.
    let dir = tempfile::tempdir().unwrap();
    std::fs::File::create(dir.path().join("red")).unwrap();
    std::fs::File::create(dir.path().join("blue")).unwrap();

    let mut orchestrator = Orchestrator::with_registry(Registry::at(dir.path()));
    let request = ExecutionRequest::broadcast(cmd(&["echo", "hi"])).unwrap();
    assert_eq!(orchestrator.run(&request).unwrap(), 0);
}

#[test]
fn test_broadcast_announces_every_namespace_in_registry_order() {
    // The announcement line is written before the attempt, so it is
    // observable even when every switch fails.
    let dir = tempfile::tempdir().unwrap();
    std::fs::File::create(dir.path().join("red")).unwrap();
    std::fs::File::create(dir.path().join("blue")).unwrap();

    let registry = Registry::at(dir.path());
    let expected: String = registry
        .list()
        .unwrap()
        .iter()
        .map(|name| format!("\nnetns: {name}\n"))
        .collect();

    let mut orchestrator = Orchestrator::with_registry(registry);
    let request = ExecutionRequest::broadcast(cmd(&["echo", "hi"])).unwrap();

    let mut out = Vec::new();
    assert_eq!(orchestrator.run_with_output(&request, &mut out).unwrap(), 0);

    let out = String::from_utf8(out).unwrap();
    assert_eq!(out, expected);
    assert_eq!(out.matches("\nnetns: red\n").count(), 1);
    assert_eq!(out.matches("\nnetns: blue\n").count(), 1);
}

#[test]
fn test_single_target_writes_no_announcement() {
    let dir = tempfile::tempdir().unwrap();
    let mut orchestrator = Orchestrator::with_registry(Registry::at(dir.path()));

    let request = ExecutionRequest::single(Some("ghost"), cmd(&["true"])).unwrap();
    let mut out = Vec::new();
    orchestrator.run_with_output(&request, &mut out).unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_nsid_state_settles_on_first_run() {
    use nsrun_netlink::NsidState;

    let dir = tempfile::tempdir().unwrap();
    let mut orchestrator = Orchestrator::with_registry(Registry::at(dir.path()));
    assert_eq!(orchestrator.nsid_state(), NsidState::Unprobed);

    let request = ExecutionRequest::broadcast(cmd(&["true"])).unwrap();
    orchestrator.run(&request).unwrap();

    // Whether or not the probe transport could be opened, the state is
    // terminal afterwards and a second run probes nothing.
    let settled = orchestrator.nsid_state();
    assert_ne!(settled, NsidState::Unprobed);

    orchestrator.run(&request).unwrap();
    assert_eq!(orchestrator.nsid_state(), settled);
}

#[test]
fn test_single_target_with_unknown_namespace_fails_in_child() {
    let dir = tempfile::tempdir().unwrap();
    let mut orchestrator = Orchestrator::with_registry(Registry::at(dir.path()));

    let request = ExecutionRequest::single(Some("ghost"), cmd(&["echo", "SHOULD_NOT_RUN"])).unwrap();
    let status = orchestrator.run(&request).unwrap();
    // The switch fails before exec; the child exits nonzero and no
    // command output is produced.
    assert_ne!(status, 0);
}

#[test]
fn test_snapshot_is_captured_before_any_switch() {
    let dir = tempfile::tempdir().unwrap();
    let mut orchestrator = Orchestrator::with_registry(Registry::at(dir.path()));
    assert!(orchestrator.snapshot().is_none());

    let request = ExecutionRequest::broadcast(cmd(&["true"])).unwrap();
    orchestrator.run(&request).unwrap();

    let snapshot = orchestrator.snapshot().expect("snapshot captured");
    assert!(snapshot.len() <= nsrun_netns::MAX_INTERFACES);
}

/// Pin the caller's own namespace under a registry name; entering it with
/// setns then works without creating a new namespace.
fn pin_own_namespace(dir: &std::path::Path, name: &str) {
    use nix::mount::{MsFlags, mount};

    let pinned = dir.join(name);
    std::fs::File::create(&pinned).unwrap();
    mount(
        Some("/proc/self/ns/net"),
        &pinned,
        None::<&str>,
        MsFlags::MS_BIND,
        None::<&str>,
    )
    .unwrap();
}

#[test]
#[ignore] // Requires root (bind mount + setns)
fn test_single_target_passes_exit_status_through() {
    let dir = tempfile::tempdir().unwrap();
    pin_own_namespace(dir.path(), "red");

    let mut orchestrator = Orchestrator::with_registry(Registry::at(dir.path()));

    let request = ExecutionRequest::single(Some("red"), cmd(&["true"])).unwrap();
    assert_eq!(orchestrator.run(&request).unwrap(), 0);

    let request = ExecutionRequest::single(Some("red"), cmd(&["false"])).unwrap();
    assert_eq!(orchestrator.run(&request).unwrap(), 1);

    nix::mount::umount(&dir.path().join("red")).unwrap();
}

#[test]
#[ignore] // Requires root (bind mount + setns)
fn test_broadcast_attempts_every_namespace() {
    let dir = tempfile::tempdir().unwrap();
    pin_own_namespace(dir.path(), "red");
    pin_own_namespace(dir.path(), "blue");

    let out = tempfile::tempdir().unwrap();
    let marker = out.path().join("ran");

    let mut orchestrator = Orchestrator::with_registry(Registry::at(dir.path()));
    let request = ExecutionRequest::broadcast(cmd(&[
        "sh",
        "-c",
        &format!("echo x >> {}", marker.display()),
    ]))
    .unwrap();
    let mut out = Vec::new();
    assert_eq!(orchestrator.run_with_output(&request, &mut out).unwrap(), 0);

    // One announcement and one command run per namespace entered.
    let out = String::from_utf8(out).unwrap();
    assert_eq!(out.matches("\nnetns: ").count(), 2);
    let lines = std::fs::read_to_string(&marker).unwrap();
    assert_eq!(lines.lines().count(), 2);

    nix::mount::umount(&dir.path().join("red")).unwrap();
    nix::mount::umount(&dir.path().join("blue")).unwrap();
}
