//! Check list loading.

use std::collections::HashSet;
use std::path::Path;

use super::ConfigError;
use crate::check::Check;

/// Load and validate the check list from a JSON file.
pub fn load_checks(path: &Path) -> Result<Vec<Check>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
        path: path.display().to_string(),
        error,
    })?;
    parse_checks(&content).map_err(|e| match e {
        ParseChecksError::Json(error) => ConfigError::Json {
            path: path.display().to_string(),
            error,
        },
        ParseChecksError::Config(e) => e,
    })
}

#[derive(Debug)]
enum ParseChecksError {
    Json(serde_json::Error),
    Config(ConfigError),
}

fn parse_checks(content: &str) -> Result<Vec<Check>, ParseChecksError> {
    let checks: Vec<Check> = serde_json::from_str(content).map_err(ParseChecksError::Json)?;
    validate(&checks).map_err(ParseChecksError::Config)?;
    Ok(checks)
}

/// Longest accepted check interval: 366 days.
pub const MAX_INTERVAL_SECS: u64 = 366 * 24 * 60 * 60;

/// Reject empty names, zero or oversized intervals, and duplicate names.
pub fn validate(checks: &[Check]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for check in checks {
        if check.name.is_empty() {
            return Err(ConfigError::Invalid {
                key: "name".into(),
                message: "check name cannot be empty".into(),
            });
        }
        if check.interval == 0 {
            return Err(ConfigError::Invalid {
                key: format!("{}.interval", check.name),
                message: "interval must be greater than zero".into(),
            });
        }
        if check.interval > MAX_INTERVAL_SECS {
            return Err(ConfigError::Invalid {
                key: format!("{}.interval", check.name),
                message: format!("interval must not exceed {} seconds", MAX_INTERVAL_SECS),
            });
        }
        if !seen.insert(check.name.as_str()) {
            return Err(ConfigError::Invalid {
                key: format!("{}.name", check.name),
                message: "duplicate check name".into(),
            });
        }
    }
    Ok(())
}
