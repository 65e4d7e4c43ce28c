//! Layout pipeline
//!
//! Runs normalization, row assignment, row ordering, coordinate assignment
//! and routing in that order. The first failing stage aborts the pipeline;
//! no partial layout is returned. Every invocation reports exactly one
//! [`LayoutEvent`] to the metrics sink, whether it succeeded or not.
//!
//! ## Key Functions
//!
//! - [`compute_layout`]: lay out with the default Cassowary engine
//! - [`compute_layout_with_engine`]: lay out with any [`OptimizationEngine`]

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use super::config::LayoutConfig;
use super::coordinates::assign_coordinates;
use super::error::LayoutError;
use super::normalize::Pedigree;
use super::ordering::order_rows;
use super::routing::route_connections;
use super::rows::assign_rows;
use super::solver::{CassowaryEngine, OptimizationEngine};
use super::telemetry::{LayoutEvent, MetricsSink};
use super::types::{ChildTriple, LayoutNode, NodeSizer, PedigreeLayout, PersonId};

/// Compute a pedigree layout with the Cassowary engine
pub fn compute_layout<M, C, S>(
    mates: M,
    children: C,
    sizer: &S,
    config: &LayoutConfig,
    metrics: &dyn MetricsSink,
) -> Result<PedigreeLayout, LayoutError>
where
    M: IntoIterator<Item = (PersonId, PersonId)>,
    C: IntoIterator<Item = ChildTriple>,
    S: NodeSizer + ?Sized,
{
    compute_layout_with_engine(mates, children, sizer, config, metrics, &CassowaryEngine)
}

/// Compute a pedigree layout with the given optimization engine
pub fn compute_layout_with_engine<M, C, S, E>(
    mates: M,
    children: C,
    sizer: &S,
    config: &LayoutConfig,
    metrics: &dyn MetricsSink,
    engine: &E,
) -> Result<PedigreeLayout, LayoutError>
where
    M: IntoIterator<Item = (PersonId, PersonId)>,
    C: IntoIterator<Item = ChildTriple>,
    S: NodeSizer + ?Sized,
    E: OptimizationEngine,
{
    let started = Instant::now();
    let mut event = LayoutEvent::default();

    let result = run_pipeline(mates, children, sizer, config, engine, &mut event);

    event.total_duration_ms = millis(started.elapsed());
    event.successful = result.is_ok();
    match &result {
        Ok(layout) => {
            event.node_count = layout.node_count();
            event.row_count = layout.row_count();
            event.width = layout.width;
            tracing::debug!(
                nodes = event.node_count,
                rows = event.row_count,
                width = event.width,
                ms = event.total_duration_ms,
                "layout computed"
            );
        }
        Err(e) => tracing::debug!(error = %e, ms = event.total_duration_ms, "layout failed"),
    }
    report(metrics, &event);

    result
}

fn run_pipeline<M, C, S, E>(
    mates: M,
    children: C,
    sizer: &S,
    config: &LayoutConfig,
    engine: &E,
    event: &mut LayoutEvent,
) -> Result<PedigreeLayout, LayoutError>
where
    M: IntoIterator<Item = (PersonId, PersonId)>,
    C: IntoIterator<Item = ChildTriple>,
    S: NodeSizer + ?Sized,
    E: OptimizationEngine,
{
    let pedigree = Pedigree::build(mates, children)?;
    event.node_count = pedigree.len();
    tracing::debug!(
        persons = pedigree.len(),
        mate_pairs = pedigree.mate_pairs().len(),
        "relations normalized"
    );

    let sizes: Vec<(f64, f64)> = pedigree.ids().iter().map(|id| sizer.size_of(id)).collect();

    let rows = timed(&mut event.row_assignment_ms, || {
        assign_rows(&pedigree, engine, config.row_timeout)
    })?;
    event.row_count = rows.row_count();
    tracing::debug!(rows = rows.row_count(), ms = event.row_assignment_ms, "rows assigned");

    let order = timed(&mut event.row_order_ms, || order_rows(&pedigree, &rows))?;
    tracing::debug!(ms = event.row_order_ms, "rows ordered");

    let coords = timed(&mut event.coordinate_ms, || {
        assign_coordinates(
            &pedigree,
            &order,
            &sizes,
            config.node_spacing,
            engine,
            config.coordinate_timeout,
        )
    })?;
    tracing::debug!(width = coords.width, ms = event.coordinate_ms, "coordinates assigned");

    let routing = timed(&mut event.routing_ms, || {
        route_connections(&pedigree, &rows, &order, &coords, &sizes)
    })?;
    tracing::debug!(
        connections = routing.connections.len(),
        ms = event.routing_ms,
        "connections routed"
    );

    let nodes = order
        .rows()
        .iter()
        .enumerate()
        .map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(|(c, p)| LayoutNode {
                    id: pedigree.id(*p).clone(),
                    row: r,
                    column: c,
                    x: coords.x[p.0],
                    width: sizes[p.0].0,
                    height: sizes[p.0].1,
                })
                .collect()
        })
        .collect();

    Ok(PedigreeLayout::new(
        nodes,
        routing.row_slot_count,
        routing.connections,
        coords.width,
    ))
}

fn timed<T>(slot: &mut u64, stage: impl FnOnce() -> T) -> T {
    let started = Instant::now();
    let out = stage();
    *slot = millis(started.elapsed());
    out
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Hand the event to the sink; sink failures and panics are logged and dropped
fn report(metrics: &dyn MetricsSink, event: &LayoutEvent) {
    match catch_unwind(AssertUnwindSafe(|| metrics.record(event))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "dropping layout metrics"),
        Err(_) => tracing::warn!("metrics sink panicked, dropping layout metrics"),
    }
}
