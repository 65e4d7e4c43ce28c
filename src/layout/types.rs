//! Core types for the layout engine

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque person identifier, compared by exact string equality
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PersonId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A child edge as supplied by the data source: up to two parents and one child
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildTriple {
    pub parent1: Option<PersonId>,
    pub parent2: Option<PersonId>,
    pub child: PersonId,
}

impl ChildTriple {
    pub fn new(parent1: Option<PersonId>, parent2: Option<PersonId>, child: PersonId) -> Self {
        Self {
            parent1,
            parent2,
            child,
        }
    }

    /// Child of a couple
    pub fn of_couple(
        a: impl Into<PersonId>,
        b: impl Into<PersonId>,
        child: impl Into<PersonId>,
    ) -> Self {
        Self {
            parent1: Some(a.into()),
            parent2: Some(b.into()),
            child: child.into(),
        }
    }

    /// Child with a single known parent
    pub fn of_single(parent: impl Into<PersonId>, child: impl Into<PersonId>) -> Self {
        Self {
            parent1: Some(parent.into()),
            parent2: None,
            child: child.into(),
        }
    }
}

/// Supplies the box size of each person; width and height are not computed here
pub trait NodeSizer {
    fn size_of(&self, id: &PersonId) -> (f64, f64);
}

impl<F> NodeSizer for F
where
    F: Fn(&PersonId) -> (f64, f64),
{
    fn size_of(&self, id: &PersonId) -> (f64, f64) {
        self(id)
    }
}

/// Every person gets the same box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformSize {
    pub width: f64,
    pub height: f64,
}

impl UniformSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl NodeSizer for UniformSize {
    fn size_of(&self, _id: &PersonId) -> (f64, f64) {
        (self.width, self.height)
    }
}

/// A positioned person
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutNode {
    pub id: PersonId,
    /// Generation index, 0 is the topmost row
    pub row: usize,
    /// Position within the row's final order
    pub column: usize,
    /// Horizontal center offset
    pub x: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutNode {
    pub fn left(&self) -> f64 {
        self.x - self.width / 2.0
    }

    pub fn right(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// Mate link between two persons, optionally feeding a group of children
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoupleConnection {
    pub id1: PersonId,
    pub id2: PersonId,
    /// Channel used by the mate link; 0 means a direct line between adjacent edges
    pub slot: usize,
    pub children_slot: Option<usize>,
    pub children: Vec<PersonId>,
}

/// Link from one known parent straight down to its children
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleParentConnection {
    pub id1: PersonId,
    pub children_slot: usize,
    pub children: Vec<PersonId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Connection {
    Couple(CoupleConnection),
    SingleParent(SingleParentConnection),
}

impl Connection {
    /// Children fed by this connection, empty for a childless couple
    pub fn children(&self) -> &[PersonId] {
        match self {
            Connection::Couple(c) => &c.children,
            Connection::SingleParent(s) => &s.children,
        }
    }

    pub fn children_slot(&self) -> Option<usize> {
        match self {
            Connection::Couple(c) => c.children_slot,
            Connection::SingleParent(s) => Some(s.children_slot),
        }
    }

    pub fn as_couple(&self) -> Option<&CoupleConnection> {
        match self {
            Connection::Couple(c) => Some(c),
            Connection::SingleParent(_) => None,
        }
    }

    pub fn as_single_parent(&self) -> Option<&SingleParentConnection> {
        match self {
            Connection::SingleParent(s) => Some(s),
            Connection::Couple(_) => None,
        }
    }
}

/// The finished, immutable layout
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PedigreeLayout {
    pub rows: Vec<Vec<LayoutNode>>,
    /// Highest slot index used by any node of each row
    pub row_slot_count: Vec<usize>,
    pub connections: Vec<Connection>,
    pub width: f64,
    #[serde(skip)]
    positions: HashMap<PersonId, (usize, usize)>,
}

impl PedigreeLayout {
    pub fn new(
        rows: Vec<Vec<LayoutNode>>,
        row_slot_count: Vec<usize>,
        connections: Vec<Connection>,
        width: f64,
    ) -> Self {
        let positions = rows
            .iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(move |(c, node)| (node.id.clone(), (r, c)))
            })
            .collect();
        Self {
            rows,
            row_slot_count,
            connections,
            width,
            positions,
        }
    }

    /// Look up the layout node of a person
    pub fn node_for(&self, id: &PersonId) -> Option<&LayoutNode> {
        let &(r, c) = self.positions.get(id)?;
        self.rows.get(r).and_then(|row| row.get(c))
    }

    /// Convenience lookup by string id
    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.node_for(&PersonId::from(id))
    }

    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// All nodes, top row first
    pub fn nodes(&self) -> impl Iterator<Item = &LayoutNode> {
        self.rows.iter().flatten()
    }

    /// The couple connection joining two persons, in either order
    pub fn couple(&self, a: &str, b: &str) -> Option<&CoupleConnection> {
        self.connections.iter().filter_map(Connection::as_couple).find(|c| {
            (c.id1.as_str() == a && c.id2.as_str() == b)
                || (c.id1.as_str() == b && c.id2.as_str() == a)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, row: usize, column: usize, x: f64) -> LayoutNode {
        LayoutNode {
            id: PersonId::from(id),
            row,
            column,
            x,
            width: 40.0,
            height: 20.0,
        }
    }

    #[test]
    fn test_node_extents() {
        let n = node("a", 0, 0, 50.0);
        assert_eq!(n.left(), 30.0);
        assert_eq!(n.right(), 70.0);
    }

    #[test]
    fn test_node_for_lookup() {
        let layout = PedigreeLayout::new(
            vec![
                vec![node("a", 0, 0, 20.0), node("b", 0, 1, 80.0)],
                vec![node("c", 1, 0, 50.0)],
            ],
            vec![0, 0],
            vec![],
            100.0,
        );
        assert_eq!(layout.node("b").map(|n| n.x), Some(80.0));
        assert_eq!(layout.node("c").map(|n| n.row), Some(1));
        assert!(layout.node("zzz").is_none());
        assert_eq!(layout.node_count(), 3);
        assert_eq!(layout.row_count(), 2);
    }

    #[test]
    fn test_closure_is_node_sizer() {
        let sizer = |id: &PersonId| (id.as_str().len() as f64 * 10.0, 5.0);
        assert_eq!(sizer.size_of(&PersonId::from("abc")), (30.0, 5.0));
    }

    #[test]
    fn test_couple_lookup_is_symmetric() {
        let layout = PedigreeLayout::new(
            vec![vec![node("a", 0, 0, 20.0), node("b", 0, 1, 80.0)]],
            vec![0],
            vec![Connection::Couple(CoupleConnection {
                id1: "a".into(),
                id2: "b".into(),
                slot: 0,
                children_slot: None,
                children: vec![],
            })],
            100.0,
        );
        assert!(layout.couple("b", "a").is_some());
        assert!(layout.couple("a", "c").is_none());
    }
}
