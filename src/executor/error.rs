//! Script execution error types.

use std::fmt;
use std::io;

/// Why a check script run did not produce a usable result.
///
/// Classification follows the output the script left behind: stdout wins over
/// stderr, and only a run that produced neither reports the launch/exit error.
#[derive(Debug)]
pub enum ExecutionError {
    /// Script failed and wrote its own message to stdout.
    ReportedOutput(String),
    /// Script failed with an empty stdout but wrote to stderr.
    ReportedStderr(String),
    /// Script could not be launched, or exited nonzero without any output.
    Failed(io::Error),
}

impl ExecutionError {
    /// Short classification label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionError::ReportedOutput(_) => "script reported output",
            ExecutionError::ReportedStderr(_) => "script reported stderr",
            ExecutionError::Failed(_) => "execution failed",
        }
    }

    pub fn is_reported_output(&self) -> bool {
        matches!(self, ExecutionError::ReportedOutput(_))
    }

    pub fn is_reported_stderr(&self) -> bool {
        matches!(self, ExecutionError::ReportedStderr(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ExecutionError::Failed(_))
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::ReportedOutput(detail) | ExecutionError::ReportedStderr(detail) => {
                write!(f, "{}: {}", self.kind(), detail.trim_end())
            }
            ExecutionError::Failed(error) => write!(f, "{}: {}", self.kind(), error),
        }
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecutionError::Failed(error) => Some(error),
            _ => None,
        }
    }
}
