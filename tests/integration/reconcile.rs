//! Tick-level behavior of a check loop against a real Prometheus sink.

use std::sync::Arc;

use crate::helpers::*;
use script_exporter::{Check, CheckLoop, PrometheusSink};

fn check_loop(
    check: Check,
    runner: Arc<ScriptedRunner>,
) -> (CheckLoop<PrometheusSink, ScriptedRunner>, Arc<PrometheusSink>) {
    let sink = Arc::new(PrometheusSink::new());
    let check_loop = CheckLoop::new(check, Arc::clone(&sink), runner, fast_config());
    (check_loop, sink)
}

/// A label-set missing from the next tick is deleted; the rest keep their latest value
#[tokio::test]
async fn test_stale_label_set_removed_on_next_tick() {
    let runner = ScriptedRunner::new(vec![
        Step::Stdout("10|disk=sda\n20|disk=sdb\n"),
        Step::Stdout("11|disk=sda\n"),
    ]);
    let check = Check::new("disk_usage", "/checks/disk.sh", 30).with_help("Disk usage");
    let (mut check_loop, sink) = check_loop(check, runner);

    check_loop.tick().await;
    assert_eq!(
        samples(&sink, "disk_usage"),
        vec![
            "disk_usage{disk=\"sda\"} 10".to_string(),
            "disk_usage{disk=\"sdb\"} 20".to_string(),
        ]
    );

    check_loop.tick().await;
    assert_eq!(
        samples(&sink, "disk_usage"),
        vec!["disk_usage{disk=\"sda\"} 11".to_string()]
    );
    assert_eq!(check_loop.lifecycle().current(), &[labels(&[("disk", "sda")])]);
}

/// Label order in script output does not create distinct series
#[tokio::test]
async fn test_label_order_is_irrelevant() {
    let runner = ScriptedRunner::new(vec![
        Step::Stdout("1|a=1,b=2\n"),
        Step::Stdout("2|b=2,a=1\n"),
    ]);
    let (mut check_loop, sink) = check_loop(Check::new("pairs", "/checks/pairs.sh", 5), runner);

    check_loop.tick().await;
    check_loop.tick().await;

    assert_eq!(
        samples(&sink, "pairs"),
        vec!["pairs{a=\"1\",b=\"2\"} 2".to_string()]
    );
}

/// The same label-set twice in one tick leaves one series with the last value
#[tokio::test]
async fn test_duplicate_observation_last_value_wins() {
    let runner = ScriptedRunner::new(vec![Step::Stdout("1|disk=sda\n7|disk=sda\n")]);
    let (mut check_loop, sink) = check_loop(Check::new("dup", "/checks/dup.sh", 5), runner);

    check_loop.tick().await;

    assert_eq!(samples(&sink, "dup"), vec!["dup{disk=\"sda\"} 7".to_string()]);
}

/// Unlabeled output exports a single bare sample
#[tokio::test]
async fn test_bare_value() {
    let runner = ScriptedRunner::new(vec![Step::Stdout("42\n")]);
    let (mut check_loop, sink) = check_loop(Check::new("answer", "/checks/answer.sh", 5), runner);

    check_loop.tick().await;

    assert_eq!(samples(&sink, "answer"), vec!["answer 42".to_string()]);
}

/// A Histogram check runs its script but never registers a series
#[tokio::test]
async fn test_unsupported_kind_never_registers() {
    let runner = ScriptedRunner::new(vec![Step::Stdout("3|bucket=1\n")]);
    let check = Check::new("latency", "/checks/latency.sh", 5).with_kind("Histogram");
    let (mut check_loop, sink) = check_loop(check, Arc::clone(&runner));
    let logs = LogCapture::start();

    for _ in 0..5 {
        check_loop.tick().await;
        assert!(!check_loop.lifecycle().has_series());
    }

    assert_eq!(runner.calls(), 5);
    assert_eq!(check_loop.ticks(), 5);
    assert!(samples(&sink, "latency").is_empty());

    // One warning per tick, never deduplicated
    let warned = logs.warnings("metric type not implemented yet");
    assert_eq!(warned.len(), 5);
    assert!(warned.iter().all(|line| line["data"]["check"] == "latency"));
}

/// A failing run (stderr, nonzero exit) changes nothing
#[tokio::test]
async fn test_stderr_failure_keeps_previous_values() {
    let runner = ScriptedRunner::new(vec![
        Step::Stdout("5|disk=sda\n"),
        Step::Stderr("timeout"),
    ]);
    let (mut check_loop, sink) = check_loop(Check::new("flaky", "/checks/flaky.sh", 5), runner);
    let logs = LogCapture::start();

    check_loop.tick().await;
    let before = exported(&sink);
    assert!(logs.warnings("check failed").is_empty());

    check_loop.tick().await;
    assert_eq!(exported(&sink), before);
    assert_eq!(samples(&sink, "flaky"), vec!["flaky{disk=\"sda\"} 5".to_string()]);

    let failures = logs.warnings("check failed");
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["data"]["kind"], "script reported stderr");
    assert_eq!(failures[0]["data"]["check"], "flaky");

    // Still tracked, so a later run without it removes it
    assert_eq!(check_loop.lifecycle().current(), &[labels(&[("disk", "sda")])]);
}

/// A failure on the very first tick leaves the sink untouched
#[tokio::test]
async fn test_first_tick_failure_emits_nothing() {
    let runner = ScriptedRunner::new(vec![Step::Stderr("timeout")]);
    let (mut check_loop, sink) = check_loop(Check::new("broken", "/checks/broken.sh", 5), runner);

    check_loop.tick().await;

    assert!(!check_loop.lifecycle().has_series());
    assert!(samples(&sink, "broken").is_empty());
    assert_eq!(check_loop.ticks(), 1);
}

/// A launch error is contained like any other failure
#[tokio::test]
async fn test_launch_error_then_recovery() {
    let runner = ScriptedRunner::new(vec![Step::LaunchError, Step::Stdout("1\n")]);
    let (mut check_loop, sink) = check_loop(Check::new("late", "/checks/late.sh", 5), runner);

    check_loop.tick().await;
    assert!(samples(&sink, "late").is_empty());

    check_loop.tick().await;
    assert_eq!(samples(&sink, "late"), vec!["late 1".to_string()]);
}

/// Unparsable values are exported as zero
#[tokio::test]
async fn test_unparsable_value_exports_zero() {
    let runner = ScriptedRunner::new(vec![Step::Stdout("n/a|disk=sda\n")]);
    let (mut check_loop, sink) = check_loop(Check::new("odd", "/checks/odd.sh", 5), runner);

    check_loop.tick().await;

    assert_eq!(samples(&sink, "odd"), vec!["odd{disk=\"sda\"} 0".to_string()]);
}
