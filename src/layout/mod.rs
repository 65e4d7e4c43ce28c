//! Layout engine for pedigree diagrams
//!
//! This module takes mate pairs and child triples and computes a
//! generation-leveled layout: rows of positioned nodes plus routed
//! connections. Each pipeline stage lives in its own module.

pub mod config;
pub mod coordinates;
pub mod engine;
pub mod error;
pub mod lint;
pub mod normalize;
pub mod ordering;
pub mod routing;
pub mod rows;
pub mod solver;
pub mod telemetry;
pub mod types;

pub use config::{ConfigError, LayoutConfig};
pub use engine::{compute_layout, compute_layout_with_engine};
pub use error::{LayoutError, LayoutStage, SelfRelationKind};
pub use normalize::{MatePair, ParentalUnit, Pedigree, PersonIdx};
pub use solver::{CassowaryEngine, OptimizationEngine, SolverError};
pub use telemetry::{LayoutEvent, MetricsError, MetricsSink, NoopMetrics, TracingMetrics};
pub use types::*;
