use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use super::{ProcessOutput, ProcessRunner};

/// Interpreter used when none is configured.
#[cfg(not(windows))]
pub const DEFAULT_SHELL: &str = "/bin/sh";

#[cfg(windows)]
pub const DEFAULT_SHELL: &str = "sh";

/// Runs check scripts through a shell interpreter: `<shell> <script>`.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: PathBuf,
}

impl ShellRunner {
    pub fn new(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    pub fn shell(&self) -> &Path {
        &self.shell
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

#[async_trait]
impl ProcessRunner for ShellRunner {
    async fn run(&self, path: &Path) -> ProcessOutput {
        match Command::new(&self.shell).arg(path).output().await {
            Ok(output) => ProcessOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                status: Ok(output.status),
            },
            Err(e) => ProcessOutput {
                stdout: String::new(),
                stderr: String::new(),
                status: Err(e),
            },
        }
    }

    fn name(&self) -> &'static str {
        "shell"
    }
}
