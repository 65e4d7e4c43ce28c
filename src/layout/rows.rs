//! Row (generation) assignment
//!
//! Every person gets an integer row. Children sit strictly below each of their
//! parents (hard), mates are pulled onto the same row (soft, strongest goal),
//! and every row index is pulled towards 0 so the tree stays compact at the top.

use std::collections::BTreeSet;
use std::time::Duration;

use super::error::{LayoutError, LayoutStage};
use super::normalize::{Pedigree, PersonIdx};
use super::solver::{
    LinearExpr, OptimizationEngine, OptimizationModel, Priority, Relation, VarId,
};

/// Row membership, before any ordering within rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowAssignment {
    row_of: Vec<usize>,
    members: Vec<Vec<PersonIdx>>,
}

impl RowAssignment {
    /// Build from a row index per person; rows must be dense from 0
    pub fn from_rows(row_of: Vec<usize>) -> Self {
        let count = row_of.iter().map(|r| r + 1).max().unwrap_or(0);
        let mut members = vec![Vec::new(); count];
        for (i, &r) in row_of.iter().enumerate() {
            members[r].push(PersonIdx(i));
        }
        Self { row_of, members }
    }

    pub fn row_of(&self, idx: PersonIdx) -> usize {
        self.row_of[idx.0]
    }

    /// Persons of each row, in first-appearance order
    pub fn members(&self) -> &[Vec<PersonIdx>] {
        &self.members
    }

    pub fn row_count(&self) -> usize {
        self.members.len()
    }
}

/// Build the row model: one integer variable per person, in person order
pub fn row_model(pedigree: &Pedigree) -> OptimizationModel {
    let mut model = OptimizationModel::new();
    let upper = pedigree.len() as f64;
    let vars: Vec<_> = pedigree
        .persons()
        .map(|p| model.integer(format!("row({})", pedigree.id(p)), 0.0, upper))
        .collect();

    for (parent, child) in pedigree.parent_edges() {
        model.require(
            LinearExpr::difference(vars[child.0], vars[parent.0]),
            Relation::Ge,
            1.0,
            format!(
                "'{}' below parent '{}'",
                pedigree.id(child),
                pedigree.id(parent)
            ),
        );
    }

    for &(a, b) in pedigree.mate_pairs() {
        model.prefer(
            LinearExpr::difference(vars[a.0], vars[b.0]),
            0.0,
            Priority::High,
        );
    }

    for var in &vars {
        model.prefer(LinearExpr::var(*var), 0.0, Priority::Low);
    }

    model
}

/// Assign a row to every known person
pub fn assign_rows<E: OptimizationEngine>(
    pedigree: &Pedigree,
    engine: &E,
    budget: Duration,
) -> Result<RowAssignment, LayoutError> {
    if pedigree.is_empty() {
        return Ok(RowAssignment::from_rows(Vec::new()));
    }

    let model = row_model(pedigree);
    let solution = engine
        .solve(&model, budget)
        .map_err(|e| LayoutError::infeasible(LayoutStage::RowAssignment, e))?;

    let raw: Vec<i64> = (0..pedigree.len())
        .map(|i| solution.get_int(VarId(i)))
        .collect();
    let row_of = compact(&raw);

    for (parent, child) in pedigree.parent_edges() {
        if row_of[child.0] <= row_of[parent.0] {
            return Err(LayoutError::invariant(format!(
                "child '{}' (row {}) is not below parent '{}' (row {})",
                pedigree.id(child),
                row_of[child.0],
                pedigree.id(parent),
                row_of[parent.0]
            )));
        }
    }

    Ok(RowAssignment::from_rows(row_of))
}

/// Map raw row values onto dense indices from 0, keeping their order
fn compact(raw: &[i64]) -> Vec<usize> {
    let distinct: Vec<i64> = raw.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    raw.iter()
        .map(|r| distinct.binary_search(r).unwrap_or(0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::solver::CassowaryEngine;
    use crate::layout::types::{ChildTriple, PersonId};

    fn rows_of(p: &Pedigree, r: &RowAssignment, id: &str) -> usize {
        r.row_of(p.idx(&PersonId::from(id)).unwrap())
    }

    fn solve(mates: &[(&str, &str)], children: Vec<ChildTriple>) -> (Pedigree, RowAssignment) {
        let p = Pedigree::build(
            mates.iter().map(|(a, b)| (PersonId::from(*a), PersonId::from(*b))),
            children,
        )
        .unwrap();
        let r = assign_rows(&p, &CassowaryEngine, Duration::from_secs(5)).unwrap();
        (p, r)
    }

    #[test]
    fn test_compact_removes_gaps() {
        assert_eq!(compact(&[0, 4, 2, 4]), vec![0, 2, 1, 2]);
        assert_eq!(compact(&[3, 3]), vec![0, 0]);
    }

    #[test]
    fn test_lone_root() {
        let (_, r) = solve(&[], vec![ChildTriple::new(None, None, PersonId::from("A"))]);
        assert_eq!(r.row_count(), 1);
        assert_eq!(r.members()[0].len(), 1);
    }

    #[test]
    fn test_children_below_parents() {
        let (p, r) = solve(
            &[("A", "B")],
            vec![
                ChildTriple::of_couple("A", "B", "C"),
                ChildTriple::of_couple("C", "D", "E"),
            ],
        );
        assert_eq!(rows_of(&p, &r, "A"), 0);
        assert_eq!(rows_of(&p, &r, "B"), 0);
        assert_eq!(rows_of(&p, &r, "C"), 1);
        assert_eq!(rows_of(&p, &r, "D"), 1);
        assert_eq!(rows_of(&p, &r, "E"), 2);
        assert_eq!(r.row_count(), 3);
    }

    #[test]
    fn test_mate_pulled_to_partner_row() {
        // D has no parents of their own but follows C down
        let (p, r) = solve(
            &[("C", "D")],
            vec![ChildTriple::of_single("A", "C")],
        );
        assert_eq!(rows_of(&p, &r, "C"), rows_of(&p, &r, "D"));
    }

    #[test]
    fn test_cycle_is_infeasible() {
        let p = Pedigree::build(
            vec![],
            vec![
                ChildTriple::of_single("A", "B"),
                ChildTriple::of_single("B", "A"),
            ],
        )
        .unwrap();
        let err = assign_rows(&p, &CassowaryEngine, Duration::from_secs(5)).unwrap_err();
        assert_eq!(err.stage(), Some(LayoutStage::RowAssignment));
    }

    #[test]
    fn test_model_shape() {
        let p = Pedigree::build(
            vec![(PersonId::from("A"), PersonId::from("B"))],
            vec![ChildTriple::of_couple("A", "B", "C")],
        )
        .unwrap();
        let model = row_model(&p);
        assert_eq!(model.variables.len(), 3);
        assert!(model.variables.iter().all(|v| v.integer));
        // two parent edges
        assert_eq!(model.constraints.len(), 2);
        // one mate goal plus one compactness goal per person
        assert_eq!(model.goals.len(), 4);
    }
}
