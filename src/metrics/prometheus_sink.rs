//! Prometheus-backed metric sink.

use std::collections::HashMap;

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use tracing::warn;

use super::sink::{MetricSink, SinkError};
use crate::check::LabelSet;

/// Metric sink writing gauge vectors into a Prometheus [`Registry`].
///
/// `Registry` and `GaugeVec` are internally synchronized, so one sink can be
/// shared by all check loops.
#[derive(Clone, Default)]
pub struct PrometheusSink {
    registry: Registry,
}

impl PrometheusSink {
    pub fn new() -> Self {
        Self::with_registry(Registry::new())
    }

    /// Use an existing registry (e.g. one shared with other collectors).
    pub fn with_registry(registry: Registry) -> Self {
        Self { registry }
    }

    /// Get the Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Export metrics in Prometheus text format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

fn label_map(labels: &LabelSet) -> HashMap<&str, &str> {
    labels
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}

impl MetricSink for PrometheusSink {
    type Gauge = GaugeVec;

    fn create_gauge(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<GaugeVec, SinkError> {
        let to_error = |e: prometheus::Error| SinkError::Create {
            name: name.to_string(),
            error: e.to_string(),
        };

        let gauge = GaugeVec::new(Opts::new(name, help), label_names).map_err(to_error)?;
        self.registry
            .register(Box::new(gauge.clone()))
            .map_err(to_error)?;
        Ok(gauge)
    }

    fn set_gauge(&self, gauge: &GaugeVec, labels: &LabelSet, value: f64) -> Result<(), SinkError> {
        let metric = gauge
            .get_metric_with(&label_map(labels))
            .map_err(|e| SinkError::Update {
                name: gauge_name(gauge),
                error: e.to_string(),
            })?;
        metric.set(value);
        Ok(())
    }

    fn delete_gauge(&self, gauge: &GaugeVec, labels: &LabelSet) -> bool {
        gauge.remove(&label_map(labels)).is_ok()
    }

    fn destroy_gauge(&self, gauge: GaugeVec) {
        let name = gauge_name(&gauge);
        if let Err(e) = self.registry.unregister(Box::new(gauge)) {
            warn!(series = %name, error = %e, "failed to unregister series");
        }
    }
}

fn gauge_name(gauge: &GaugeVec) -> String {
    use prometheus::core::Collector;

    gauge
        .desc()
        .first()
        .map(|d| d.fq_name.clone())
        .unwrap_or_default()
}
