//! Check script execution.
//!
//! A [`ProcessRunner`] launches one script and captures everything it wrote;
//! [`execute_script`] turns that raw outcome into either the script's stdout
//! or a classified [`ExecutionError`].
//!
//! | Runner | Description |
//! |--------|-------------|
//! | [`ShellRunner`] | Launches `<shell> <script>` via `tokio::process` |
//!
//! No timeout is enforced here: a hanging script blocks only its own check.

mod error;
mod shell;

use std::io;
use std::path::Path;
use std::process::ExitStatus;

use async_trait::async_trait;
use tracing::debug;

pub use error::ExecutionError;
pub use shell::{ShellRunner, DEFAULT_SHELL};

/// Everything a finished (or failed-to-start) script run left behind.
#[derive(Debug)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit status, or the error that prevented launching or waiting.
    pub status: io::Result<ExitStatus>,
}

impl ProcessOutput {
    /// Error describing an unsuccessful run, `None` on exit code 0.
    fn exit_error(&self) -> Option<io::Error> {
        match &self.status {
            Ok(status) if status.success() => None,
            Ok(status) => Some(io::Error::other(format!("script exited with {}", status))),
            Err(e) => Some(io::Error::new(e.kind(), e.to_string())),
        }
    }
}

/// Launches check scripts.
///
/// Implementations must be safe to share across every check loop.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run the script at `path` with no arguments and wait for it to exit.
    async fn run(&self, path: &Path) -> ProcessOutput;

    /// Runner name for logging.
    fn name(&self) -> &'static str;
}

/// Run one check script and return its stdout on success.
pub async fn execute_script<R>(runner: &R, path: &Path) -> Result<String, ExecutionError>
where
    R: ProcessRunner + ?Sized,
{
    debug!(script = %path.display(), runner = runner.name(), "executing script");
    let output = runner.run(path).await;
    classify(output)
}

/// Map a raw process outcome to the result contract.
pub fn classify(output: ProcessOutput) -> Result<String, ExecutionError> {
    let Some(error) = output.exit_error() else {
        return Ok(output.stdout);
    };

    if !output.stdout.is_empty() {
        return Err(ExecutionError::ReportedOutput(output.stdout));
    }
    if !output.stderr.is_empty() {
        return Err(ExecutionError::ReportedStderr(output.stderr));
    }
    Err(ExecutionError::Failed(error))
}
