//! Real check scripts run through `/bin/sh`.
#![cfg(unix)]

use std::path::PathBuf;
use std::sync::Arc;

use crate::helpers::*;
use script_exporter::executor::execute_script;
use script_exporter::{Check, CheckLoop, PrometheusSink, ShellRunner};

fn write_script(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
    path
}

/// Output on a nonzero exit is reported as the failure
#[tokio::test]
async fn test_execute_classifies_stdout_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(&dir, "partial.sh", "echo 'half done'\necho oops >&2\nexit 1\n");

    let err = execute_script(&ShellRunner::default(), &script)
        .await
        .unwrap_err();
    assert!(err.is_reported_output(), "unexpected error: {}", err);
    assert!(err.to_string().contains("half done"));
}

/// A silent nonzero exit is an execution failure
#[tokio::test]
async fn test_execute_classifies_silent_failure() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(&dir, "quiet.sh", "exit 3\n");

    let err = execute_script(&ShellRunner::default(), &script)
        .await
        .unwrap_err();
    assert!(err.is_failed(), "unexpected error: {}", err);
}

/// A script whose output changes between runs drives series removal
#[tokio::test]
async fn test_check_loop_with_shell_script() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state");
    let body = format!(
        "if [ -f '{state}' ]; then\n  echo '2|disk=sda'\nelse\n  touch '{state}'\n  echo '1|disk=sda'\n  echo '9|disk=sdb'\nfi\n",
        state = state.display()
    );
    let script = write_script(&dir, "disks.sh", &body);

    let sink = Arc::new(PrometheusSink::new());
    let check = Check::new("disk_free", script, 30).with_help("Free disk space");
    let mut check_loop = CheckLoop::new(
        check,
        Arc::clone(&sink),
        Arc::new(ShellRunner::default()),
        fast_config(),
    );

    check_loop.tick().await;
    assert_eq!(
        samples(&sink, "disk_free"),
        vec![
            "disk_free{disk=\"sda\"} 1".to_string(),
            "disk_free{disk=\"sdb\"} 9".to_string(),
        ]
    );
    assert!(exported(&sink).contains("# HELP disk_free Free disk space"));

    check_loop.tick().await;
    assert_eq!(
        samples(&sink, "disk_free"),
        vec!["disk_free{disk=\"sda\"} 2".to_string()]
    );
}
