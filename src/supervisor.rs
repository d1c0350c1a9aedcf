//! Starts and stops the full set of check loops.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::check::Check;
use crate::executor::ProcessRunner;
use crate::metrics::MetricSink;
use crate::scheduler::{CheckLoop, LoopReport, SchedulerConfig};

/// Supervises one [`CheckLoop`] task per active check.
///
/// The supervisor owns the stop signal. Each `start` creates a fresh channel,
/// so a stopped supervisor can be started again.
pub struct Supervisor<S: MetricSink, R: ProcessRunner + ?Sized + 'static> {
    checks: Vec<Check>,
    sink: Arc<S>,
    runner: Arc<R>,
    config: SchedulerConfig,
    /// Stop signal sender; `None` while stopped.
    stop_tx: Option<watch::Sender<bool>>,
    handles: Vec<JoinHandle<LoopReport>>,
    /// Number of loops currently running (shared with /health).
    running: Arc<AtomicUsize>,
}

impl<S, R> Supervisor<S, R>
where
    S: MetricSink,
    R: ProcessRunner + ?Sized + 'static,
{
    pub fn new(checks: Vec<Check>, sink: Arc<S>, runner: Arc<R>, config: SchedulerConfig) -> Self {
        Self {
            checks,
            sink,
            runner,
            config,
            stop_tx: None,
            handles: Vec::new(),
            running: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Whether loops have been started and not yet stopped.
    pub fn is_started(&self) -> bool {
        self.stop_tx.is_some()
    }

    /// Count of loops that have not yet reached `Stopped`.
    pub fn running_count(&self) -> usize {
        self.running.load(Ordering::Relaxed)
    }

    /// Shared running-loop counter.
    pub fn running_ref(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.running)
    }

    /// Spawn one loop per active check. Must be called inside a Tokio runtime.
    pub fn start(&mut self) {
        if self.is_started() {
            warn!("checks already started");
            return;
        }

        debug!("starting all checks");
        let (stop_tx, stop_rx) = watch::channel(false);

        for check in &self.checks {
            if !check.active {
                info!(check = %check.name, "check not active");
                continue;
            }

            let check_loop = CheckLoop::new(
                check.clone(),
                Arc::clone(&self.sink),
                Arc::clone(&self.runner),
                self.config,
            );
            let guard = RunningGuard::new(&self.running);
            let stop_rx = stop_rx.clone();

            self.handles.push(tokio::spawn(async move {
                let _guard = guard;
                check_loop.run(stop_rx).await
            }));
        }

        info!(
            checks = self.checks.len(),
            started = self.handles.len(),
            "checks started"
        );
        self.stop_tx = Some(stop_tx);
    }

    /// Broadcast stop and wait for every loop to tear down.
    ///
    /// Returns one report per loop that finished normally. Calling `stop`
    /// while not started is a no-op.
    pub async fn stop(&mut self) -> Vec<LoopReport> {
        let Some(stop_tx) = self.stop_tx.take() else {
            debug!("checks not running, nothing to stop");
            return Vec::new();
        };

        debug!("stopping all checks");
        // Receivers also stop if every sender is gone, so a send error is fine
        let _ = stop_tx.send(true);

        let handles = std::mem::take(&mut self.handles);
        let mut reports = Vec::with_capacity(handles.len());
        for result in join_all(handles).await {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => warn!(error = %e, "check loop terminated abnormally"),
            }
        }

        debug!(stopped = reports.len(), "all checks are stopped");
        reports
    }
}

/// Decrements the running counter when a loop task ends, even on panic.
struct RunningGuard(Arc<AtomicUsize>);

impl RunningGuard {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(Arc::clone(counter))
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}
