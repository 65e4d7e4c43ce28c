//! Lint engine for detecting defects in a computed pedigree layout.
//!
//! Runs after routing to check the result against the relations it was built
//! from: generation order, overlapping boxes, row ordering, mate adjacency and
//! node coverage. Adjacency findings are heuristic outcomes rather than errors.

use std::collections::HashSet;
use std::fmt;

use super::normalize::Pedigree;
use super::types::{PedigreeLayout, PersonId};

/// Tolerance for floating point comparisons of solved offsets
const EPSILON: f64 = 1e-6;

/// A lint warning about a layout defect
#[derive(Debug)]
pub struct LintWarning {
    pub category: LintCategory,
    pub message: String,
}

/// Category of lint defect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintCategory {
    Generation,
    Overlap,
    Ordering,
    Adjacency,
    Coverage,
}

impl fmt::Display for LintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintCategory::Generation => write!(f, "generation"),
            LintCategory::Overlap => write!(f, "overlap"),
            LintCategory::Ordering => write!(f, "ordering"),
            LintCategory::Adjacency => write!(f, "adjacency"),
            LintCategory::Coverage => write!(f, "coverage"),
        }
    }
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

/// Run all lint checks on a completed layout.
pub fn check(layout: &PedigreeLayout, pedigree: &Pedigree) -> Vec<LintWarning> {
    let mut warnings = Vec::new();
    check_coverage(layout, pedigree, &mut warnings);
    check_generations(layout, pedigree, &mut warnings);
    check_rows(layout, &mut warnings);
    check_adjacency(layout, pedigree, &mut warnings);
    warnings
}

fn warn(warnings: &mut Vec<LintWarning>, category: LintCategory, message: String) {
    warnings.push(LintWarning { category, message });
}

// ── Coverage ──────────────────────────────────────────────────────

fn check_coverage(layout: &PedigreeLayout, pedigree: &Pedigree, warnings: &mut Vec<LintWarning>) {
    let known: HashSet<&PersonId> = pedigree.ids().iter().collect();
    let mut placed: HashSet<&PersonId> = HashSet::new();

    for node in layout.nodes() {
        if !placed.insert(&node.id) {
            warn(
                warnings,
                LintCategory::Coverage,
                format!("\"{}\" is placed more than once", node.id),
            );
        }
        if !known.contains(&node.id) {
            warn(
                warnings,
                LintCategory::Coverage,
                format!("\"{}\" is placed but appears in no relation", node.id),
            );
        }
    }
    for id in pedigree.ids() {
        if !placed.contains(id) {
            warn(
                warnings,
                LintCategory::Coverage,
                format!("\"{}\" has no layout node", id),
            );
        }
    }
}

// ── Generation order ──────────────────────────────────────────────

fn check_generations(layout: &PedigreeLayout, pedigree: &Pedigree, warnings: &mut Vec<LintWarning>) {
    for (parent, child) in pedigree.parent_edges() {
        let (parent, child) = (pedigree.id(parent), pedigree.id(child));
        let (Some(p), Some(c)) = (layout.node_for(parent), layout.node_for(child)) else {
            continue;
        };
        if c.row <= p.row {
            warn(
                warnings,
                LintCategory::Generation,
                format!(
                    "\"{}\" (row {}) is not below parent \"{}\" (row {})",
                    child, c.row, parent, p.row
                ),
            );
        }
    }
}

// ── Row ordering and overlap ──────────────────────────────────────

fn check_rows(layout: &PedigreeLayout, warnings: &mut Vec<LintWarning>) {
    for (r, row) in layout.rows.iter().enumerate() {
        for (i, node) in row.iter().enumerate() {
            if node.row != r || node.column != i {
                warn(
                    warnings,
                    LintCategory::Ordering,
                    format!(
                        "\"{}\" sits at row {} column {} but claims row {} column {}",
                        node.id, r, i, node.row, node.column
                    ),
                );
            }
        }
        for pair in row.windows(2) {
            let (left, right) = (&pair[0], &pair[1]);
            if right.x <= left.x {
                warn(
                    warnings,
                    LintCategory::Ordering,
                    format!(
                        "\"{}\" (x={:.1}) is not right of \"{}\" (x={:.1})",
                        right.id, right.x, left.id, left.x
                    ),
                );
            }
            if right.left() + EPSILON < left.right() {
                warn(
                    warnings,
                    LintCategory::Overlap,
                    format!(
                        "\"{}\" and \"{}\" overlap by {:.1}",
                        left.id,
                        right.id,
                        left.right() - right.left()
                    ),
                );
            }
        }
    }
}

// ── Mate adjacency ────────────────────────────────────────────────

fn check_adjacency(layout: &PedigreeLayout, pedigree: &Pedigree, warnings: &mut Vec<LintWarning>) {
    for &(a, b) in pedigree.mate_pairs() {
        let (a, b) = (pedigree.id(a), pedigree.id(b));
        let (Some(na), Some(nb)) = (layout.node_for(a), layout.node_for(b)) else {
            continue;
        };
        if na.row == nb.row && na.column.abs_diff(nb.column) != 1 {
            warn(
                warnings,
                LintCategory::Adjacency,
                format!(
                    "mates \"{}\" and \"{}\" are {} columns apart",
                    a,
                    b,
                    na.column.abs_diff(nb.column)
                ),
            );
        }
    }
}
