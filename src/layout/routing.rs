//! Connection routing between persons
//!
//! Connectors are drawn orthogonally. Each row owns a stack of horizontal
//! channels ("slots") just below its nodes; a link claims one slot on every
//! node it passes over so that no two links share a channel segment. Slot 0 is
//! reserved for the direct line between two adjacent mates and is never used
//! for a children link.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::coordinates::Coordinates;
use super::error::LayoutError;
use super::normalize::{ParentalUnit, Pedigree, PersonIdx};
use super::ordering::RowOrder;
use super::rows::RowAssignment;
use super::types::{Connection, CoupleConnection, PersonId, SingleParentConnection};

/// Slot used by a direct line between adjacent mates
pub const DIRECT_SLOT: usize = 0;

/// What a slot claim is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimKind {
    MateLink,
    ChildrenLink,
}

/// One slot reserved on a run of nodes of a single row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotClaim {
    /// Index into the routed connection list
    pub connection: usize,
    pub kind: ClaimKind,
    pub row: usize,
    pub nodes: Vec<PersonIdx>,
    pub slot: usize,
}

/// Per-node slot occupancy
#[derive(Debug, Clone, Default)]
pub struct SlotTable {
    occupied: Vec<BTreeSet<usize>>,
    claims: Vec<SlotClaim>,
}

impl SlotTable {
    pub fn new(persons: usize) -> Self {
        Self {
            occupied: vec![BTreeSet::new(); persons],
            claims: Vec::new(),
        }
    }

    pub fn is_free(&self, nodes: &[PersonIdx], slot: usize) -> bool {
        nodes.iter().all(|n| !self.occupied[n.0].contains(&slot))
    }

    /// Lowest slot at or above `from` that is free on every node
    pub fn lowest_free(&self, nodes: &[PersonIdx], from: usize) -> usize {
        (from..)
            .find(|slot| self.is_free(nodes, *slot))
            .unwrap_or(from)
    }

    pub fn claim(&mut self, claim: SlotClaim) -> Result<(), LayoutError> {
        if !self.is_free(&claim.nodes, claim.slot) {
            return Err(LayoutError::invariant(format!(
                "slot {} on row {} claimed twice",
                claim.slot, claim.row
            )));
        }
        for n in &claim.nodes {
            self.occupied[n.0].insert(claim.slot);
        }
        tracing::trace!(
            row = claim.row,
            slot = claim.slot,
            nodes = claim.nodes.len(),
            kind = ?claim.kind,
            "slot claimed"
        );
        self.claims.push(claim);
        Ok(())
    }

    /// Highest slot used on a node, 0 if none
    pub fn max_slot(&self, node: PersonIdx) -> usize {
        self.occupied[node.0].iter().next_back().copied().unwrap_or(0)
    }

    pub fn claims(&self) -> &[SlotClaim] {
        &self.claims
    }
}

/// Router output
#[derive(Debug, Clone)]
pub struct Routing {
    pub connections: Vec<Connection>,
    pub row_slot_count: Vec<usize>,
    pub claims: Vec<SlotClaim>,
}

struct Geometry<'a> {
    order: &'a RowOrder,
    x: &'a [f64],
    sizes: &'a [(f64, f64)],
}

impl Geometry<'_> {
    fn left(&self, p: PersonIdx) -> f64 {
        self.x[p.0] - self.sizes[p.0].0 / 2.0
    }

    fn right(&self, p: PersonIdx) -> f64 {
        self.x[p.0] + self.sizes[p.0].0 / 2.0
    }

    fn row(&self, r: usize) -> Result<&[PersonIdx], LayoutError> {
        self.order
            .rows()
            .get(r)
            .map(|v| v.as_slice())
            .ok_or_else(|| LayoutError::invariant(format!("row {} out of range", r)))
    }

    /// Nodes of a row between two columns, inclusive
    fn span_by_columns(&self, r: usize, a: PersonIdx, b: PersonIdx) -> Result<Vec<PersonIdx>, LayoutError> {
        let (ca, cb) = (self.order.column_of(a), self.order.column_of(b));
        let row = self.row(r)?;
        Ok(row[ca.min(cb)..=ca.max(cb)].to_vec())
    }

    /// Nodes of a row whose extent touches `[lo, hi]`
    fn span_by_extent(&self, r: usize, lo: f64, hi: f64) -> Result<Vec<PersonIdx>, LayoutError> {
        Ok(self
            .row(r)?
            .iter()
            .copied()
            .filter(|n| self.right(*n) >= lo && self.left(*n) <= hi)
            .collect())
    }

    fn extent(&self, persons: impl IntoIterator<Item = PersonIdx>) -> (f64, f64) {
        persons.into_iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(self.left(p)), hi.max(self.right(p)))
        })
    }
}

/// Allocate slots for every mate link and children link
pub fn route_connections(
    pedigree: &Pedigree,
    rows: &RowAssignment,
    order: &RowOrder,
    coords: &Coordinates,
    sizes: &[(f64, f64)],
) -> Result<Routing, LayoutError> {
    let geo = Geometry {
        order,
        x: &coords.x,
        sizes,
    };
    let id = |p: PersonIdx| -> PersonId { pedigree.id(p).clone() };
    let mut table = SlotTable::new(pedigree.len());
    let mut connections: Vec<Connection> = Vec::new();
    let mut couples: HashMap<ParentalUnit, usize> = HashMap::new();
    let mut visited: HashSet<ParentalUnit> = HashSet::new();

    // Mate links, top to bottom and left to right
    for row in order.rows() {
        for &node in row {
            for &mate in pedigree.mates_of(node) {
                let key = ParentalUnit::couple(node, mate);
                if !visited.insert(key) {
                    continue;
                }
                let (rn, rm) = (rows.row_of(node), rows.row_of(mate));
                let adjacent = rn == rm && order.column_of(node).abs_diff(order.column_of(mate)) == 1;

                let (row, nodes, slot) = if adjacent && table.is_free(&[node, mate], DIRECT_SLOT) {
                    (rn, vec![node, mate], DIRECT_SLOT)
                } else if rn == rm {
                    let span = geo.span_by_columns(rn, node, mate)?;
                    let slot = table.lowest_free(&span, DIRECT_SLOT + 1);
                    (rn, span, slot)
                } else {
                    let upper = rn.min(rm);
                    let (lo, hi) = geo.extent([node, mate]);
                    let span = geo.span_by_extent(upper, lo, hi)?;
                    let slot = table.lowest_free(&span, DIRECT_SLOT + 1);
                    (upper, span, slot)
                };

                table.claim(SlotClaim {
                    connection: connections.len(),
                    kind: ClaimKind::MateLink,
                    row,
                    nodes,
                    slot,
                })?;
                couples.insert(key, connections.len());
                connections.push(Connection::Couple(CoupleConnection {
                    id1: id(node),
                    id2: id(mate),
                    slot,
                    children_slot: None,
                    children: Vec::new(),
                }));
            }
        }
    }

    let sorted_children = |kids: &BTreeSet<PersonIdx>| -> Vec<PersonIdx> {
        let mut kids: Vec<PersonIdx> = kids.iter().copied().collect();
        kids.sort_by_key(|k| (rows.row_of(*k), order.column_of(*k)));
        kids
    };

    // Children links hanging off couples, in connection order
    let mut couple_units: Vec<(usize, ParentalUnit, &BTreeSet<PersonIdx>)> = Vec::new();
    let mut single_units: Vec<(PersonIdx, &BTreeSet<PersonIdx>)> = Vec::new();
    for (unit, kids) in pedigree.units() {
        match *unit {
            ParentalUnit::Couple(..) => {
                let index = couples.get(unit).copied().ok_or_else(|| {
                    LayoutError::invariant("child group of a couple without a mate link")
                })?;
                couple_units.push((index, *unit, kids));
            }
            ParentalUnit::Single(parent) => single_units.push((parent, kids)),
        }
    }
    couple_units.sort_by_key(|(index, _, _)| *index);
    single_units.sort_by_key(|(p, _)| (rows.row_of(*p), order.column_of(*p)));

    for (index, unit, kids) in couple_units {
        let members = unit.members();
        let lower = members.iter().map(|p| rows.row_of(*p)).max().unwrap_or(0);
        let kids = sorted_children(kids);
        let (lo, hi) = geo.extent(members.iter().chain(kids.iter()).copied());
        let span = geo.span_by_extent(lower, lo, hi)?;
        let slot = table.lowest_free(&span, DIRECT_SLOT + 1);
        table.claim(SlotClaim {
            connection: index,
            kind: ClaimKind::ChildrenLink,
            row: lower,
            nodes: span,
            slot,
        })?;
        if let Some(Connection::Couple(couple)) = connections.get_mut(index) {
            couple.children_slot = Some(slot);
            couple.children = kids.into_iter().map(id).collect();
        }
    }

    for (parent, kids) in single_units {
        let row = rows.row_of(parent);
        let kids = sorted_children(kids);
        let (lo, hi) = geo.extent(std::iter::once(parent).chain(kids.iter().copied()));
        let span = geo.span_by_extent(row, lo, hi)?;
        let slot = table.lowest_free(&span, DIRECT_SLOT + 1);
        table.claim(SlotClaim {
            connection: connections.len(),
            kind: ClaimKind::ChildrenLink,
            row,
            nodes: span,
            slot,
        })?;
        connections.push(Connection::SingleParent(SingleParentConnection {
            id1: id(parent),
            children_slot: slot,
            children: kids.into_iter().map(id).collect(),
        }));
    }

    let row_slot_count = order
        .rows()
        .iter()
        .map(|row| row.iter().map(|n| table.max_slot(*n)).max().unwrap_or(0))
        .collect();

    Ok(Routing {
        connections,
        row_slot_count,
        claims: table.claims,
    })
}
