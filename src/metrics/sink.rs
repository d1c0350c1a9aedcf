//! Metric sink abstraction.

use std::fmt;

use crate::check::LabelSet;

/// Errors reported by a metric sink.
#[derive(Debug, Clone)]
pub enum SinkError {
    /// The series group could not be created or registered.
    Create { name: String, error: String },
    /// A value could not be set for a label combination.
    Update { name: String, error: String },
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Create { name, error } => {
                write!(f, "failed to create series {}: {}", name, error)
            }
            SinkError::Update { name, error } => {
                write!(f, "failed to update series {}: {}", name, error)
            }
        }
    }
}

impl std::error::Error for SinkError {}

/// Registry the check loops report into.
///
/// A sink is shared by every loop and must accept concurrent calls. Each loop
/// only touches series groups it created itself.
pub trait MetricSink: Send + Sync + 'static {
    /// Handle to a registered gauge series group.
    type Gauge: Send + Sync + 'static;

    /// Create and register a gauge group dimensioned by `label_names`.
    fn create_gauge(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<Self::Gauge, SinkError>;

    /// Set the value of one label combination, creating it if absent.
    fn set_gauge(&self, gauge: &Self::Gauge, labels: &LabelSet, value: f64)
        -> Result<(), SinkError>;

    /// Remove one label combination. Returns `false` if it was not present.
    fn delete_gauge(&self, gauge: &Self::Gauge, labels: &LabelSet) -> bool;

    /// Unregister the whole group.
    fn destroy_gauge(&self, gauge: Self::Gauge);
}
