//! Left-to-right ordering within rows
//!
//! Rows are processed top to bottom. The first row keeps first-appearance
//! order. Every later row is seeded by walking the previous row's final order
//! and emitting the children of each person's parental units, so sibling groups
//! stay contiguous and sit under their parents. A second pass splices mates
//! next to each other. This is a heuristic; it is deterministic for a given
//! input order.

use std::cmp::Reverse;
use std::collections::HashMap;

use super::error::LayoutError;
use super::normalize::{ParentalUnit, Pedigree, PersonIdx};
use super::rows::RowAssignment;

/// Ordered row contents with O(1) position lookup and explicit splicing
#[derive(Debug, Clone, Default)]
pub struct RowSequence {
    items: Vec<PersonIdx>,
    position: HashMap<PersonIdx, usize>,
}

impl RowSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: PersonIdx) -> bool {
        self.position.contains_key(&item)
    }

    pub fn position_of(&self, item: PersonIdx) -> Option<usize> {
        self.position.get(&item).copied()
    }

    pub fn get(&self, index: usize) -> Option<PersonIdx> {
        self.items.get(index).copied()
    }

    /// Append an item; items already present are ignored
    pub fn push(&mut self, item: PersonIdx) {
        if !self.contains(item) {
            self.position.insert(item, self.items.len());
            self.items.push(item);
        }
    }

    /// Move an item so that it ends up at `target`
    pub fn move_to(&mut self, item: PersonIdx, target: usize) {
        let Some(from) = self.position_of(item) else {
            return;
        };
        let target = target.min(self.items.len() - 1);
        if from == target {
            return;
        }
        let moved = self.items.remove(from);
        self.items.insert(target, moved);
        for i in from.min(target)..=from.max(target) {
            self.position.insert(self.items[i], i);
        }
    }

    pub fn as_slice(&self) -> &[PersonIdx] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<PersonIdx> {
        self.items
    }
}

/// Final left-to-right order of every row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOrder {
    rows: Vec<Vec<PersonIdx>>,
    column_of: Vec<usize>,
}

impl RowOrder {
    pub fn rows(&self) -> &[Vec<PersonIdx>] {
        &self.rows
    }

    pub fn column_of(&self, idx: PersonIdx) -> usize {
        self.column_of[idx.0]
    }
}

/// Order every row, top to bottom
pub fn order_rows(pedigree: &Pedigree, rows: &RowAssignment) -> Result<RowOrder, LayoutError> {
    let mut placed_at: Vec<Option<usize>> = vec![None; pedigree.len()];
    let mut counter = 0usize;
    let mut ordered: Vec<Vec<PersonIdx>> = Vec::with_capacity(rows.row_count());

    for (r, members) in rows.members().iter().enumerate() {
        let in_row = |p: PersonIdx| rows.row_of(p) == r;
        let mut seq = RowSequence::new();

        if let Some(previous) = ordered.last() {
            for &person in previous {
                let mut mates: Vec<PersonIdx> = pedigree.mates_of(person).iter().copied().collect();
                mates.sort_by_key(|m| Reverse(placed_at[m.0]));

                let units = std::iter::once(ParentalUnit::Single(person))
                    .chain(mates.iter().map(|&m| ParentalUnit::couple(person, m)));
                for unit in units {
                    for child in pedigree.children_of(&unit) {
                        if in_row(child) && !seq.contains(child) {
                            place_with_mates(pedigree, &mut seq, child, &in_row);
                        }
                    }
                }
            }
            for &person in members {
                if !seq.contains(person) {
                    place_with_mates(pedigree, &mut seq, person, &in_row);
                }
            }
        } else {
            for &person in members {
                seq.push(person);
            }
        }

        cluster_mates(pedigree, &mut seq, &in_row);

        if seq.len() != members.len() || members.iter().any(|m| !seq.contains(*m)) {
            return Err(LayoutError::invariant(format!(
                "row {} ordering covers {} of {} members",
                r,
                seq.len(),
                members.len()
            )));
        }

        let order = seq.into_vec();
        for &person in &order {
            placed_at[person.0] = Some(counter);
            counter += 1;
        }
        ordered.push(order);
    }

    let mut column_of = vec![0; pedigree.len()];
    for row in &ordered {
        for (c, p) in row.iter().enumerate() {
            column_of[p.0] = c;
        }
    }

    Ok(RowOrder {
        rows: ordered,
        column_of,
    })
}

/// Place a person with their same-row mates around them: one mate, the
/// person, then the remaining mates
fn place_with_mates(
    pedigree: &Pedigree,
    seq: &mut RowSequence,
    person: PersonIdx,
    in_row: &impl Fn(PersonIdx) -> bool,
) {
    let mates: Vec<PersonIdx> = pedigree
        .mates_of(person)
        .iter()
        .copied()
        .filter(|m| in_row(*m) && !seq.contains(*m))
        .collect();
    match mates.split_first() {
        Some((first, rest)) => {
            seq.push(*first);
            seq.push(person);
            for m in rest {
                seq.push(*m);
            }
        }
        None => seq.push(person),
    }
}

/// Splice same-row mates next to each other, moving the later node towards
/// the earlier one
fn cluster_mates(pedigree: &Pedigree, seq: &mut RowSequence, in_row: &impl Fn(PersonIdx) -> bool) {
    let mut i = 0;
    while i < seq.len() {
        let Some(node) = seq.get(i) else { break };
        let mates = pedigree.mates_of(node);

        let mut insert_at = i + 1;
        while seq.get(insert_at).is_some_and(|n| mates.contains(&n)) {
            insert_at += 1;
        }
        for &mate in mates.iter().filter(|m| in_row(**m)) {
            if seq.position_of(mate).is_some_and(|pos| pos > insert_at) {
                seq.move_to(mate, insert_at);
                insert_at += 1;
            }
        }
        i += 1;
    }
}
