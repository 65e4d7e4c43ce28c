//! Graph normalization
//!
//! Turns raw mate pairs and child triples into canonical lookups keyed by a
//! dense per-person index. Indices are handed out in first-appearance order,
//! which is the stable iteration order every later stage relies on.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::error::{LayoutError, SelfRelationKind};
use super::types::{ChildTriple, PersonId};

/// Dense index of a known person, assigned during normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PersonIdx(pub usize);

/// A validated, unordered mate relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatePair {
    pub a: PersonId,
    pub b: PersonId,
}

impl MatePair {
    /// Build a mate pair, rejecting a person paired with themselves
    pub fn new(a: impl Into<PersonId>, b: impl Into<PersonId>) -> Result<Self, LayoutError> {
        let (a, b) = (a.into(), b.into());
        if a == b {
            return Err(LayoutError::self_relation(a, SelfRelationKind::Mate));
        }
        Ok(Self { a, b })
    }
}

/// The parent side of a child edge
///
/// Couples are stored with the lower index first, so `(A, B)` and `(B, A)`
/// produce the same key, and a lone parent never compares equal to a couple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParentalUnit {
    Single(PersonIdx),
    Couple(PersonIdx, PersonIdx),
}

impl ParentalUnit {
    pub fn couple(a: PersonIdx, b: PersonIdx) -> Self {
        if a <= b {
            Self::Couple(a, b)
        } else {
            Self::Couple(b, a)
        }
    }

    pub fn from_parents(p1: Option<PersonIdx>, p2: Option<PersonIdx>) -> Option<Self> {
        match (p1, p2) {
            (Some(a), Some(b)) => Some(Self::couple(a, b)),
            (Some(a), None) | (None, Some(a)) => Some(Self::Single(a)),
            (None, None) => None,
        }
    }

    pub fn members(&self) -> Vec<PersonIdx> {
        match *self {
            Self::Single(a) => vec![a],
            Self::Couple(a, b) => vec![a, b],
        }
    }
}

/// Canonical relation lookups for one layout invocation
#[derive(Debug, Clone, Default)]
pub struct Pedigree {
    persons: Vec<PersonId>,
    index: HashMap<PersonId, PersonIdx>,
    mates: Vec<BTreeSet<PersonIdx>>,
    parents: Vec<BTreeSet<PersonIdx>>,
    children: BTreeMap<ParentalUnit, BTreeSet<PersonIdx>>,
    mate_pairs: Vec<(PersonIdx, PersonIdx)>,
}

impl Pedigree {
    /// Normalize raw relations
    ///
    /// The two parents of a two-parent child are registered as mates as well.
    pub fn build<M, C>(mates: M, children: C) -> Result<Self, LayoutError>
    where
        M: IntoIterator<Item = (PersonId, PersonId)>,
        C: IntoIterator<Item = ChildTriple>,
    {
        let mut pedigree = Self::default();
        for (a, b) in mates {
            pedigree.add_mates(MatePair::new(a, b)?);
        }
        for triple in children {
            pedigree.add_child(triple)?;
        }
        Ok(pedigree)
    }

    fn intern(&mut self, id: PersonId) -> PersonIdx {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = PersonIdx(self.persons.len());
        self.index.insert(id.clone(), idx);
        self.persons.push(id);
        self.mates.push(BTreeSet::new());
        self.parents.push(BTreeSet::new());
        idx
    }

    pub fn add_mates(&mut self, pair: MatePair) {
        let a = self.intern(pair.a);
        let b = self.intern(pair.b);
        self.link_mates(a, b);
    }

    fn link_mates(&mut self, a: PersonIdx, b: PersonIdx) {
        if self.mates[a.0].insert(b) {
            self.mates[b.0].insert(a);
            self.mate_pairs.push((a.min(b), a.max(b)));
        }
    }

    pub fn add_child(&mut self, triple: ChildTriple) -> Result<(), LayoutError> {
        let ChildTriple {
            parent1,
            parent2,
            child,
        } = triple;
        for parent in parent1.iter().chain(parent2.iter()) {
            if *parent == child {
                return Err(LayoutError::self_relation(child, SelfRelationKind::Parent));
            }
        }
        if let (Some(a), Some(b)) = (&parent1, &parent2) {
            if a == b {
                return Err(LayoutError::self_relation(a.clone(), SelfRelationKind::CoParent));
            }
        }

        let p1 = parent1.map(|p| self.intern(p));
        let p2 = parent2.map(|p| self.intern(p));
        let child = self.intern(child);

        if let (Some(a), Some(b)) = (p1, p2) {
            self.link_mates(a, b);
        }
        if let Some(unit) = ParentalUnit::from_parents(p1, p2) {
            for parent in unit.members() {
                self.parents[child.0].insert(parent);
            }
            self.children.entry(unit).or_default().insert(child);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    pub fn id(&self, idx: PersonIdx) -> &PersonId {
        &self.persons[idx.0]
    }

    pub fn idx(&self, id: &PersonId) -> Option<PersonIdx> {
        self.index.get(id).copied()
    }

    /// All known persons in first-appearance order
    pub fn persons(&self) -> impl Iterator<Item = PersonIdx> + '_ {
        (0..self.persons.len()).map(PersonIdx)
    }

    pub fn ids(&self) -> &[PersonId] {
        &self.persons
    }

    pub fn mates_of(&self, idx: PersonIdx) -> &BTreeSet<PersonIdx> {
        &self.mates[idx.0]
    }

    pub fn parents_of(&self, idx: PersonIdx) -> &BTreeSet<PersonIdx> {
        &self.parents[idx.0]
    }

    /// Children of a parental unit, empty if it has none
    pub fn children_of(&self, unit: &ParentalUnit) -> impl Iterator<Item = PersonIdx> + '_ {
        self.children.get(unit).into_iter().flatten().copied()
    }

    pub fn units(&self) -> impl Iterator<Item = (&ParentalUnit, &BTreeSet<PersonIdx>)> {
        self.children.iter()
    }

    /// Unique mate pairs, lower index first, in the order they were recorded
    pub fn mate_pairs(&self) -> &[(PersonIdx, PersonIdx)] {
        &self.mate_pairs
    }

    /// Every `(parent, child)` edge
    pub fn parent_edges(&self) -> impl Iterator<Item = (PersonIdx, PersonIdx)> + '_ {
        self.parents
            .iter()
            .enumerate()
            .flat_map(|(c, ps)| ps.iter().map(move |p| (*p, PersonIdx(c))))
    }
}
