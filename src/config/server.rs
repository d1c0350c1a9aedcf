//! Server and runtime configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use super::parse::{env_or, env_parse};
use super::ConfigError;
use crate::executor::DEFAULT_SHELL;

/// Server configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address of the /metrics and /health server (default: 0.0.0.0:9469).
    pub listen_addr: SocketAddr,
    /// JSON file with the check definitions (default: checks.json).
    pub checks_file: PathBuf,
    /// Interpreter used to launch check scripts (default: /bin/sh).
    pub shell: PathBuf,
    /// Tokio worker threads (0 = one per CPU).
    pub worker_threads: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_addr = env_or("LISTEN_ADDR", "0.0.0.0:9469");
        let listen_addr: SocketAddr = raw_addr.parse().map_err(|e| ConfigError::Parse {
            key: "LISTEN_ADDR".into(),
            value: raw_addr.clone(),
            error: format!("{}", e),
        })?;

        Ok(Self {
            listen_addr,
            checks_file: PathBuf::from(env_or("CHECKS_FILE", "checks.json")),
            shell: PathBuf::from(env_or("SCRIPT_SHELL", DEFAULT_SHELL)),
            worker_threads: env_parse("WORKER_THREADS", 0usize)?,
        })
    }

    /// Resolved worker thread count (never zero).
    pub fn worker_count(&self) -> usize {
        if self.worker_threads == 0 {
            num_cpus::get()
        } else {
            self.worker_threads
        }
    }
}
