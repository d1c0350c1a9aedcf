//! script_exporter - Prometheus exporter driven by periodic check scripts.
//!
//! Each configured check runs a shell script on a fixed interval, parses its
//! stdout into `value|label=value,...` observations and keeps one gauge group
//! per check in sync with the latest run. Label combinations that disappear
//! from the output are removed on the next tick.
//!
//! # Architecture
//!
//! ```text
//! Supervisor ──spawns──▶ CheckLoop (one tokio task per active check)
//!                           │
//!                           ├── executor::execute_script   (stdout / stderr / failure)
//!                           ├── parser::parse_output       (Observation list)
//!                           └── metrics::MetricLifecycle   (set, reconcile, teardown)
//!                                         │
//!                                         ▼
//!                               metrics::PrometheusSink ◀── server (/metrics, /health)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use script_exporter::{PrometheusSink, SchedulerConfig, ShellRunner, Supervisor};
//!
//! let checks = script_exporter::config::load_checks("checks.json".as_ref())?;
//! let mut supervisor = Supervisor::new(
//!     checks,
//!     Arc::new(PrometheusSink::new()),
//!     Arc::new(ShellRunner::default()),
//!     SchedulerConfig::default(),
//! );
//! supervisor.start();
//! // ...
//! supervisor.stop().await;
//! ```

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git commit hash (8 chars) with optional "-dirty" suffix
pub const BUILD_VERSION: &str = env!("BUILD_VERSION");

/// Full version string: "0.1.0 (abc12345)" or "0.1.0 (abc12345-dirty)"
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_VERSION"), ")");

pub mod check;
pub mod config;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod parser;
pub mod scheduler;
pub mod server;
pub mod supervisor;

// Re-exports for convenience
pub use check::{Check, LabelSet, MetricKind};
pub use config::Config;
pub use executor::{ExecutionError, ProcessRunner, ShellRunner};
pub use metrics::{MetricLifecycle, MetricSink, PrometheusSink};
pub use scheduler::{CheckLoop, SchedulerConfig};
pub use server::{ExporterServer, ExporterState};
pub use supervisor::Supervisor;
