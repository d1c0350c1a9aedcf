//! Configuration module for script_exporter.
//!
//! Runtime settings come from environment variables; the check list comes
//! from a JSON file named by `CHECKS_FILE`.
//!
//! # Example
//!
//! ```rust,ignore
//! use script_exporter::config::Config;
//!
//! let config = Config::from_env()?;
//! println!("Listen address: {}", config.server.listen_addr);
//! println!("Checks: {}", config.checks.len());
//! ```

mod checks;
mod error;
mod logging;
mod parse;
mod scheduler;
mod server;

pub use checks::{load_checks, validate, MAX_INTERVAL_SECS};
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use parse::parse_duration;
pub use server::ServerConfig;

use crate::check::Check;
use crate::scheduler::SchedulerConfig;

/// Serializes tests that mutate process environment.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Complete application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Scheduler timing.
    pub scheduler: SchedulerConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Check definitions, in file order.
    pub checks: Vec<Check>,
}

impl Config {
    /// Load configuration from environment variables and the checks file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let server = ServerConfig::from_env()?;
        let checks = load_checks(&server.checks_file)?;
        Ok(Self {
            scheduler: SchedulerConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
            checks,
            server,
        })
    }

    /// Print configuration summary to log.
    pub fn log_summary(&self) {
        use tracing::info;

        info!("Configuration loaded:");
        info!("  Listen: {}", self.server.listen_addr);
        info!("  Checks file: {}", self.server.checks_file.display());
        info!("  Shell: {}", self.server.shell.display());
        info!("  Workers: {}", self.server.worker_count());
        info!("  Poll quantum: {:?}", self.scheduler.poll_quantum);

        match self.scheduler.safety_bound {
            Some(bound) => info!("  Safety bound: {:?}", bound),
            None => info!("  Safety bound: disabled"),
        }

        let active = self.checks.iter().filter(|c| c.active).count();
        info!("  Checks: {} ({} active)", self.checks.len(), active);
    }
}
