//! The per-check scheduling loop.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tracing::{debug, trace, warn, Instrument};
use uuid::Uuid;

use super::state::{ExitReason, LoopReport, LoopState};
use super::SchedulerConfig;
use crate::check::Check;
use crate::executor::{execute_script, ProcessRunner};
use crate::metrics::{MetricLifecycle, MetricSink};
use crate::parser::parse_output;

/// Current wall-clock time in whole seconds since the epoch.
pub fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// One check's scheduling loop and all of its mutable state.
///
/// Ticks are strictly sequential: the next tick cannot start before the
/// previous one has reconciled and the loop has slept.
pub struct CheckLoop<S: MetricSink, R: ProcessRunner + ?Sized> {
    check: Check,
    runner: Arc<R>,
    lifecycle: MetricLifecycle<S>,
    config: SchedulerConfig,
    next_run_epoch: i64,
    state: LoopState,
    ticks: u64,
    clock: fn() -> i64,
}

impl<S, R> CheckLoop<S, R>
where
    S: MetricSink,
    R: ProcessRunner + ?Sized,
{
    /// Create a loop whose first tick is due immediately.
    pub fn new(check: Check, sink: Arc<S>, runner: Arc<R>, config: SchedulerConfig) -> Self {
        let lifecycle = MetricLifecycle::new(&check, sink);
        Self {
            check,
            runner,
            lifecycle,
            config,
            next_run_epoch: now_epoch() - 1,
            state: LoopState::Idle,
            ticks: 0,
            clock: now_epoch,
        }
    }

    /// Override when the first tick becomes due.
    pub fn with_next_run(mut self, epoch: i64) -> Self {
        self.next_run_epoch = epoch;
        self
    }

    /// Replace the wall-clock source used to decide when a tick is due.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn check(&self) -> &Check {
        &self.check
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn next_run_epoch(&self) -> i64 {
        self.next_run_epoch
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn lifecycle(&self) -> &MetricLifecycle<S> {
        &self.lifecycle
    }

    /// Interval in seconds, clamped to the epoch range.
    fn interval_secs(&self) -> i64 {
        i64::try_from(self.check.interval).unwrap_or(i64::MAX)
    }

    fn transition(&mut self, next: LoopState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        trace!(check = %self.check.name, from = %self.state, to = %next, "state transition");
        self.state = next;
    }

    /// Run one tick: execute, parse, record, reconcile, reschedule.
    pub async fn tick(&mut self) {
        let span = tracing::debug_span!("tick", check = %self.check.name, run = %Uuid::new_v4());
        async {
            debug!(check = %self.check.name, "running check");

            self.lifecycle.begin_tick();
            self.lifecycle.ensure_supported();

            match execute_script(&*self.runner, &self.check.script).await {
                Ok(output) => {
                    for observation in parse_output(&output) {
                        self.lifecycle
                            .record_observation(observation.value, observation.labels);
                    }
                }
                Err(e) => {
                    warn!(
                        check = %self.check.name,
                        kind = e.kind(),
                        error = %e,
                        "check failed"
                    );
                }
            }

            self.lifecycle.reconcile();

            self.next_run_epoch = self.next_run_epoch.saturating_add(self.interval_secs());
            self.ticks += 1;
            debug!(
                check = %self.check.name,
                next_run = self.next_run_epoch,
                "finished check"
            );
        }
        .instrument(span)
        .await
    }

    /// Drive the loop until a stop signal (or stall), then tear down.
    ///
    /// The stop signal is observed between ticks and during the idle sleep;
    /// an in-flight script is never interrupted.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> LoopReport {
        let stall_limit = self
            .config
            .safety_bound
            .map(|bound| Duration::from_secs(self.check.interval).saturating_add(bound));
        let mut last_progress = Instant::now();

        let reason = loop {
            if *stop.borrow() {
                debug!(check = %self.check.name, "stopping check");
                break ExitReason::Signal;
            }

            let now = (self.clock)();
            if now > self.next_run_epoch {
                self.transition(LoopState::Running);
                self.tick().await;
                self.transition(LoopState::Idle);
                last_progress = Instant::now();
            } else if self.next_run_epoch.saturating_sub(now) > self.interval_secs() {
                // The next run can never be more than one interval away
                warn!(
                    check = %self.check.name,
                    next_run = self.next_run_epoch,
                    now,
                    "wall clock moved backwards, rescheduling"
                );
                self.next_run_epoch = now.saturating_sub(1);
                last_progress = Instant::now();
            } else if let Some(limit) = stall_limit {
                if last_progress.elapsed() > limit {
                    warn!(
                        check = %self.check.name,
                        idle_secs = last_progress.elapsed().as_secs(),
                        "no tick became due within safety bound, forcing stop"
                    );
                    break ExitReason::Stalled;
                }
            }

            tokio::select! {
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        debug!(check = %self.check.name, "stopping check");
                        break ExitReason::Signal;
                    }
                }
                _ = tokio::time::sleep(self.config.poll_quantum) => {}
            }
        };

        self.transition(LoopState::Stopping);
        self.lifecycle.teardown();
        self.transition(LoopState::Stopped);

        LoopReport {
            check: self.check.name.clone(),
            ticks: self.ticks,
            state: self.state,
            reason,
        }
    }
}
