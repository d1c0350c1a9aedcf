//! Scheduler timing configuration.

use std::time::Duration;

use super::parse::env_duration;
use super::ConfigError;
use crate::scheduler::SchedulerConfig;

impl SchedulerConfig {
    /// Load POLL_QUANTUM (default 1s) and SAFETY_BOUND (default 10s, "off" disables).
    pub fn from_env() -> Result<Self, ConfigError> {
        let poll_quantum = env_duration("POLL_QUANTUM", "1s")?.ok_or_else(|| {
            ConfigError::Invalid {
                key: "POLL_QUANTUM".into(),
                message: "poll quantum cannot be zero".into(),
            }
        })?;
        let safety_bound = env_duration("SAFETY_BOUND", "10s")?;

        Ok(Self {
            poll_quantum,
            safety_bound,
        })
    }

    /// Worst-case delay between a stop signal and a loop noticing it.
    pub fn stop_latency(&self) -> Duration {
        self.poll_quantum
    }
}
