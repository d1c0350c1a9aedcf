//! Supervisor start/stop across several checks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::helpers::*;
use script_exporter::scheduler::ExitReason;
use script_exporter::{Check, PrometheusSink, Supervisor};

fn checks() -> Vec<Check> {
    vec![
        Check::new("first", "/checks/first.sh", 3600),
        Check::new("second", "/checks/second.sh", 3600),
        Check::new("disabled", "/checks/disabled.sh", 3600).with_active(false),
    ]
}

/// Two sleeping loops both stop within one quantum of the signal
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_while_sleeping() {
    let sink = Arc::new(PrometheusSink::new());
    let runner = ScriptedRunner::new(vec![Step::Stdout("1|host=a\n")]);
    let mut supervisor = Supervisor::new(checks(), Arc::clone(&sink), Arc::clone(&runner), fast_config());

    supervisor.start();
    assert_eq!(supervisor.running_count(), 2);

    // Both first ticks are immediate; afterwards the loops only sleep
    assert!(wait_until(Duration::from_secs(2), || runner.calls() == 2).await);
    assert!(wait_until(Duration::from_secs(2), || samples(&sink, "second").len() == 1).await);
    assert_eq!(samples(&sink, "first"), vec!["first{host=\"a\"} 1".to_string()]);

    let started = Instant::now();
    let reports = supervisor.stop().await;
    let elapsed = started.elapsed();

    assert!(
        elapsed < fast_config().poll_quantum + Duration::from_millis(500),
        "stop took {:?}",
        elapsed
    );
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.reason == ExitReason::Signal));
    assert!(reports.iter().all(|r| r.ticks == 1));
    assert_eq!(supervisor.running_count(), 0);

    // Teardown unregistered every series
    assert!(samples(&sink, "first").is_empty());
    assert!(samples(&sink, "second").is_empty());
}

/// Restarting after a stop registers series again
#[tokio::test]
async fn test_restart_after_stop() {
    let sink = Arc::new(PrometheusSink::new());
    let runner = ScriptedRunner::new(vec![Step::Stdout("5\n")]);
    let mut supervisor = Supervisor::new(
        vec![Check::new("restartable", "/checks/r.sh", 3600)],
        Arc::clone(&sink),
        Arc::clone(&runner),
        fast_config(),
    );

    supervisor.start();
    assert!(wait_until(Duration::from_secs(2), || samples(&sink, "restartable").len() == 1).await);
    supervisor.stop().await;
    assert!(samples(&sink, "restartable").is_empty());

    supervisor.start();
    assert!(wait_until(Duration::from_secs(2), || samples(&sink, "restartable").len() == 1).await);
    assert_eq!(runner.calls(), 2);

    let reports = supervisor.stop().await;
    assert_eq!(reports.len(), 1);
}
