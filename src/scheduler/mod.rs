//! Per-check scheduling.
//!
//! Every active check gets its own [`CheckLoop`], spawned as an independent
//! Tokio task. A loop polls coarsely: it wakes every `poll_quantum`, runs a
//! tick once wall-clock time has passed the check's next run, and listens
//! for the shared stop signal while it sleeps.
//!
//! ```text
//! ┌──────────────────────── CheckLoop ────────────────────────┐
//! │  sleep(quantum) / stop? ──▶ due? ──▶ tick:                │
//! │                                      execute_script       │
//! │                                      parse_output         │
//! │                                      record_observation*  │
//! │                                      reconcile            │
//! │                                      next_run += interval │
//! └───────────────────────────────────────────────────────────┘
//! ```

mod check_loop;
mod state;

use std::time::Duration;

pub use check_loop::{now_epoch, CheckLoop};
pub use state::{ExitReason, LoopReport, LoopState};

/// Timing knobs shared by all check loops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Idle sleep between loop iterations; bounds scheduling jitter and
    /// stop latency.
    pub poll_quantum: Duration,
    /// How long past its interval a loop may go without a tick before it is
    /// forced to stop. `None` disables the cap.
    pub safety_bound: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_quantum: Duration::from_secs(1),
            safety_bound: Some(Duration::from_secs(10)),
        }
    }
}
