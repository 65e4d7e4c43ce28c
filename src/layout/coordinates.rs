//! Horizontal coordinate assignment
//!
//! One continuous variable per node holds its x-center. Consecutive nodes of a
//! row are kept apart by their half-widths plus the configured spacing. Soft
//! goals, strongest first: children under their parents' midpoint, mates next
//! to each other, everything pulled left for a compact width.

use std::time::Duration;

use super::error::{LayoutError, LayoutStage};
use super::normalize::{ParentalUnit, Pedigree};
use super::ordering::RowOrder;
use super::solver::{
    LinearExpr, OptimizationEngine, OptimizationModel, Priority, Relation, VarId,
};

/// Solved x-centers, indexed by person
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    pub x: Vec<f64>,
    /// Maximum over all nodes of x-center plus half-width
    pub width: f64,
}

/// Build the coordinate model; `sizes` holds (width, height) per person
pub fn coordinate_model(
    pedigree: &Pedigree,
    order: &RowOrder,
    sizes: &[(f64, f64)],
    spacing: f64,
) -> OptimizationModel {
    let mut model = OptimizationModel::new();
    let vars: Vec<VarId> = pedigree
        .persons()
        .map(|p| model.continuous(format!("x({})", pedigree.id(p))))
        .collect();
    let half = |i: usize| sizes[i].0 / 2.0;

    for row in order.rows() {
        if let Some(first) = row.first() {
            model.require(
                LinearExpr::var(vars[first.0]),
                Relation::Ge,
                half(first.0),
                format!("'{}' inside left edge", pedigree.id(*first)),
            );
        }
        for pair in row.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            model.require(
                LinearExpr::difference(vars[right.0], vars[left.0]),
                Relation::Ge,
                half(left.0) + half(right.0) + spacing,
                format!(
                    "'{}' right of '{}'",
                    pedigree.id(right),
                    pedigree.id(left)
                ),
            );
        }
    }

    for (unit, children) in pedigree.units() {
        for child in children {
            let expr = match *unit {
                ParentalUnit::Single(p) => LinearExpr::difference(vars[child.0], vars[p.0]),
                ParentalUnit::Couple(a, b) => LinearExpr::new()
                    .plus(vars[child.0], 2.0)
                    .plus(vars[a.0], -1.0)
                    .plus(vars[b.0], -1.0),
            };
            model.prefer(expr, 0.0, Priority::High);
        }
    }

    for &(a, b) in pedigree.mate_pairs() {
        model.prefer(
            LinearExpr::difference(vars[a.0], vars[b.0]),
            0.0,
            Priority::Medium,
        );
    }

    for p in pedigree.persons() {
        model.prefer(LinearExpr::var(vars[p.0]), half(p.0), Priority::Low);
    }

    model
}

/// Assign an x-center to every node
pub fn assign_coordinates<E: OptimizationEngine>(
    pedigree: &Pedigree,
    order: &RowOrder,
    sizes: &[(f64, f64)],
    spacing: f64,
    engine: &E,
    budget: Duration,
) -> Result<Coordinates, LayoutError> {
    if sizes.len() != pedigree.len() {
        return Err(LayoutError::invariant(format!(
            "{} sizes for {} persons",
            sizes.len(),
            pedigree.len()
        )));
    }
    if let Some((i, (w, h))) = sizes
        .iter()
        .enumerate()
        .find(|(_, (w, h))| !(w.is_finite() && h.is_finite() && *w >= 0.0 && *h >= 0.0))
    {
        return Err(LayoutError::invariant(format!(
            "'{}' has invalid size {}x{}",
            pedigree.ids()[i],
            w,
            h
        )));
    }
    if pedigree.is_empty() {
        return Ok(Coordinates {
            x: Vec::new(),
            width: 0.0,
        });
    }

    let model = coordinate_model(pedigree, order, sizes, spacing);
    let solution = engine
        .solve(&model, budget)
        .map_err(|e| LayoutError::infeasible(LayoutStage::CoordinateAssignment, e))?;

    let x: Vec<f64> = (0..pedigree.len()).map(|i| solution.get(VarId(i))).collect();
    let width = x
        .iter()
        .zip(sizes)
        .map(|(x, (w, _))| x + w / 2.0)
        .fold(0.0, f64::max);

    Ok(Coordinates { x, width })
}
