//! Check loop states and exit reasons.

use std::fmt;

/// Where a check loop is in its lifecycle.
///
/// ```text
/// Idle ──(now > next run)──▶ Running ──(tick done)──▶ Idle
///  │
///  └──(stop signal / stall)──▶ Stopping ──(teardown)──▶ Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for the next run or a stop signal.
    Idle,
    /// Executing one tick.
    Running,
    /// Tearing down the check's series.
    Stopping,
    /// Terminal.
    Stopped,
}

impl LoopState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: LoopState) -> bool {
        matches!(
            (self, next),
            (LoopState::Idle, LoopState::Running)
                | (LoopState::Running, LoopState::Idle)
                | (LoopState::Idle, LoopState::Stopping)
                | (LoopState::Stopping, LoopState::Stopped)
        )
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Why a check loop left its run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The supervisor broadcast a stop.
    Signal,
    /// No tick became due within the interval plus the safety bound.
    Stalled,
}

/// Summary returned by a finished loop.
#[derive(Debug, Clone)]
pub struct LoopReport {
    pub check: String,
    pub ticks: u64,
    pub state: LoopState,
    pub reason: ExitReason,
}
