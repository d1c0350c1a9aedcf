//! Check definitions and the label-set type shared by the parser and metrics.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

/// One dimension of a check's metric: label name -> label value.
///
/// Backed by an ordered map, so equality ignores insertion order.
pub type LabelSet = BTreeMap<String, String>;

/// Render a label-set as `{k1="v1",k2="v2"}` for log output.
pub fn format_labels(labels: &LabelSet) -> String {
    let pairs: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, v))
        .collect();
    format!("{{{}}}", pairs.join(","))
}

/// Metric kind a check reports as.
///
/// Only [`MetricKind::Gauge`] is backed by a series implementation. The other
/// known kinds are accepted from configuration but report as unsupported at
/// runtime; anything unrecognized is kept verbatim in [`MetricKind::Unknown`].
#[derive(Clone, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum MetricKind {
    #[default]
    Gauge,
    Counter,
    Histogram,
    Summary,
    Unknown(String),
}

impl MetricKind {
    /// Whether series of this kind can be created.
    pub fn is_supported(&self) -> bool {
        matches!(self, MetricKind::Gauge)
    }

    pub fn as_str(&self) -> &str {
        match self {
            MetricKind::Gauge => "Gauge",
            MetricKind::Counter => "Counter",
            MetricKind::Histogram => "Histogram",
            MetricKind::Summary => "Summary",
            MetricKind::Unknown(raw) => raw,
        }
    }
}

impl From<String> for MetricKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Gauge" => MetricKind::Gauge,
            "Counter" => MetricKind::Counter,
            "Histogram" => MetricKind::Histogram,
            "Summary" => MetricKind::Summary,
            _ => MetricKind::Unknown(raw),
        }
    }
}

impl From<&str> for MetricKind {
    fn from(raw: &str) -> Self {
        MetricKind::from(raw.to_string())
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured check: one script, one schedule, one metric series group.
///
/// Immutable once loaded; the per-run state lives in the check's own loop.
#[derive(Clone, Debug, Deserialize)]
pub struct Check {
    /// Unique identifier, also the metric name.
    pub name: String,
    /// Help text for the metric (defaults to the name).
    #[serde(default)]
    pub help: String,
    /// Path to the check script.
    #[serde(rename = "file")]
    pub script: PathBuf,
    /// Polling period in seconds.
    pub interval: u64,
    #[serde(rename = "metric_type", default)]
    pub metric_kind: MetricKind,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Check {
    /// Create an active gauge check.
    pub fn new(name: impl Into<String>, script: impl Into<PathBuf>, interval: u64) -> Self {
        let name = name.into();
        Self {
            help: name.clone(),
            name,
            script: script.into(),
            interval,
            metric_kind: MetricKind::Gauge,
            active: true,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn with_kind(mut self, kind: impl Into<MetricKind>) -> Self {
        self.metric_kind = kind.into();
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Help text, falling back to the name when none was configured.
    pub fn help_text(&self) -> &str {
        if self.help.is_empty() {
            &self.name
        } else {
            &self.help
        }
    }
}
