//! Per-check series lifecycle: create once, update, retire stale label-sets.

use std::mem;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::sink::MetricSink;
use crate::check::{format_labels, Check, LabelSet, MetricKind};

/// A registered series group, typed by metric kind.
pub enum SeriesHandle<S: MetricSink> {
    Gauge(S::Gauge),
}

impl<S: MetricSink> SeriesHandle<S> {
    fn set(&self, sink: &S, labels: &LabelSet, value: f64) -> Result<(), super::SinkError> {
        match self {
            SeriesHandle::Gauge(gauge) => sink.set_gauge(gauge, labels, value),
        }
    }

    fn delete(&self, sink: &S, labels: &LabelSet) -> bool {
        match self {
            SeriesHandle::Gauge(gauge) => sink.delete_gauge(gauge, labels),
        }
    }

    fn destroy(self, sink: &S) {
        match self {
            SeriesHandle::Gauge(gauge) => sink.destroy_gauge(gauge),
        }
    }
}

/// Owns one check's series group and the label-sets seen per tick.
///
/// Exactly one loop drives a lifecycle, so none of its state is synchronized.
pub struct MetricLifecycle<S: MetricSink> {
    name: String,
    help: String,
    kind: MetricKind,
    sink: Arc<S>,
    handle: Option<SeriesHandle<S>>,
    result_previous: Vec<LabelSet>,
    result_current: Vec<LabelSet>,
}

impl<S: MetricSink> MetricLifecycle<S> {
    pub fn new(check: &Check, sink: Arc<S>) -> Self {
        Self {
            name: check.name.clone(),
            help: check.help_text().to_string(),
            kind: check.metric_kind.clone(),
            sink,
            handle: None,
            result_previous: Vec::new(),
            result_current: Vec::new(),
        }
    }

    /// Whether a series group is currently registered.
    pub fn has_series(&self) -> bool {
        self.handle.is_some()
    }

    /// Label-sets recorded during the current tick.
    pub fn current(&self) -> &[LabelSet] {
        &self.result_current
    }

    /// Label-sets recorded during the previous tick.
    pub fn previous(&self) -> &[LabelSet] {
        &self.result_previous
    }

    /// Start a new tick: the current label-sets become the previous ones.
    pub fn begin_tick(&mut self) {
        self.result_previous = mem::take(&mut self.result_current);
    }

    /// Check the metric kind, warning when it has no series implementation.
    ///
    /// Called once per tick so an unsupported check keeps reporting itself.
    pub fn ensure_supported(&self) -> bool {
        match &self.kind {
            MetricKind::Gauge => true,
            MetricKind::Unknown(raw) => {
                warn!(check = %self.name, metric_type = %raw, "unknown metric type, no series registered");
                false
            }
            kind => {
                warn!(check = %self.name, metric_type = %kind, "metric type not implemented yet");
                false
            }
        }
    }

    /// Record one observation for this tick and push it to the sink.
    ///
    /// The first observation fixes the label names of the series group.
    pub fn record_observation(&mut self, value: f64, labels: LabelSet) {
        trace!(
            check = %self.name,
            value,
            labels = %format_labels(&labels),
            "result from check"
        );

        if !self.kind.is_supported() {
            self.result_current.push(labels);
            return;
        }

        if self.handle.is_none() {
            let label_names: Vec<&str> = labels.keys().map(String::as_str).collect();
            match self.sink.create_gauge(&self.name, &self.help, &label_names) {
                Ok(gauge) => {
                    debug!(check = %self.name, labels = ?label_names, "registered series");
                    self.handle = Some(SeriesHandle::Gauge(gauge));
                }
                Err(e) => {
                    warn!(check = %self.name, error = %e, "failed to register series");
                    return;
                }
            }
        }

        let Some(handle) = self.handle.as_ref() else {
            return;
        };
        match handle.set(&self.sink, &labels, value) {
            Ok(()) => self.result_current.push(labels),
            Err(e) => warn!(
                check = %self.name,
                labels = %format_labels(&labels),
                error = %e,
                "failed to set series value"
            ),
        }
    }

    /// Delete series whose label-set was seen last tick but not this one.
    ///
    /// A tick that recorded nothing (failed run, empty output) keeps the
    /// previous label-sets as current so they stay live and tracked.
    /// Returns the number of series removed.
    pub fn reconcile(&mut self) -> usize {
        trace!(
            check = %self.name,
            previous = self.result_previous.len(),
            current = self.result_current.len(),
            "reconciling series"
        );

        if self.result_current.is_empty() {
            self.result_current = mem::take(&mut self.result_previous);
            return 0;
        }

        let mut stale: Vec<&LabelSet> = Vec::new();
        for labels in &self.result_previous {
            if !self.result_current.contains(labels) && !stale.contains(&labels) {
                stale.push(labels);
            }
        }

        let Some(handle) = self.handle.as_ref() else {
            return 0;
        };

        let mut removed = 0;
        for labels in stale {
            debug!(check = %self.name, labels = %format_labels(labels), "removing stale series");
            if handle.delete(&self.sink, labels) {
                removed += 1;
            } else {
                warn!(
                    check = %self.name,
                    labels = %format_labels(labels),
                    "failed to delete stale series"
                );
            }
        }
        removed
    }

    /// Unregister the series group. Safe to call more than once.
    pub fn teardown(&mut self) {
        self.result_previous.clear();
        self.result_current.clear();

        if let Some(handle) = self.handle.take() {
            handle.destroy(&self.sink);
            debug!(check = %self.name, "unregistered series");
        }
    }
}
