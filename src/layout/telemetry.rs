//! Layout metrics
//!
//! The facade reports one [`LayoutEvent`] per invocation to a [`MetricsSink`].
//! A failing sink never fails the layout.

use serde::Serialize;
use thiserror::Error;

/// Error returned by a metrics sink
#[derive(Error, Debug)]
#[error("metrics sink failed: {0}")]
pub struct MetricsError(pub String);

/// Timing and size figures of one layout invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEvent {
    pub total_duration_ms: u64,
    pub row_assignment_ms: u64,
    pub row_order_ms: u64,
    pub coordinate_ms: u64,
    pub routing_ms: u64,
    pub node_count: usize,
    pub row_count: usize,
    pub width: f64,
    pub successful: bool,
}

/// Receiver of layout events
pub trait MetricsSink {
    fn record(&self, event: &LayoutEvent) -> Result<(), MetricsError>;
}

impl<S: MetricsSink + ?Sized> MetricsSink for &S {
    fn record(&self, event: &LayoutEvent) -> Result<(), MetricsError> {
        (**self).record(event)
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record(&self, _event: &LayoutEvent) -> Result<(), MetricsError> {
        Ok(())
    }
}

/// Emits every event as a structured `tracing` event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn record(&self, event: &LayoutEvent) -> Result<(), MetricsError> {
        tracing::info!(
            target: "pedigree_layout::metrics",
            total_duration_ms = event.total_duration_ms,
            row_assignment_ms = event.row_assignment_ms,
            row_order_ms = event.row_order_ms,
            coordinate_ms = event.coordinate_ms,
            routing_ms = event.routing_ms,
            node_count = event.node_count,
            row_count = event.row_count,
            width = event.width,
            successful = event.successful,
            "layout"
        );
        Ok(())
    }
}
