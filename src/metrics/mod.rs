//! Metric sinks and the per-check series lifecycle.
//!
//! The scheduler never talks to a metrics backend directly. Each check loop
//! owns a [`MetricLifecycle`], which drives a shared [`MetricSink`]:
//!
//! ```text
//! observation ──▶ MetricLifecycle ──▶ MetricSink (PrometheusSink)
//!                   │  create once        │
//!                   │  set per label-set  │
//!                   │  delete stale       │
//!                   └─ teardown ─────────▶┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use script_exporter::metrics::{MetricLifecycle, PrometheusSink};
//!
//! let sink = Arc::new(PrometheusSink::new());
//! let mut lifecycle = MetricLifecycle::new(&check, Arc::clone(&sink));
//! lifecycle.begin_tick();
//! lifecycle.record_observation(3.5, labels);
//! lifecycle.reconcile();
//! println!("{}", sink.export()?);
//! ```

mod lifecycle;
mod prometheus_sink;
mod sink;

pub use lifecycle::{MetricLifecycle, SeriesHandle};
pub use prometheus_sink::PrometheusSink;
pub use sink::{MetricSink, SinkError};
