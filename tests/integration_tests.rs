//! Integration tests for the pedigree layout pipeline

use pedigree_layout::layout::{
    compute_layout, ChildTriple, Connection, LayoutConfig, LayoutError, MatePair, NoopMetrics,
    PedigreeLayout, PersonId, SelfRelationKind, UniformSize,
};

const TOLERANCE: f64 = 1e-6;

fn pair(a: &str, b: &str) -> (PersonId, PersonId) {
    (PersonId::from(a), PersonId::from(b))
}

fn lay_out(
    mates: Vec<(PersonId, PersonId)>,
    children: Vec<ChildTriple>,
) -> Result<PedigreeLayout, LayoutError> {
    compute_layout(
        mates,
        children,
        &UniformSize::new(120.0, 40.0),
        &LayoutConfig::default(),
        &NoopMetrics,
    )
}

fn row_ids(layout: &PedigreeLayout, row: usize) -> Vec<&str> {
    layout.rows[row].iter().map(|n| n.id.as_str()).collect()
}

#[test]
fn test_lone_root() {
    let layout = lay_out(vec![], vec![ChildTriple::new(None, None, PersonId::from("A"))])
        .expect("Should lay out");

    assert_eq!(layout.row_count(), 1);
    assert_eq!(row_ids(&layout, 0), vec!["A"]);
    assert!(layout.connections.is_empty());
    assert_eq!(layout.row_slot_count, vec![0]);
    assert!((layout.width - 120.0).abs() < TOLERANCE);
}

#[test]
fn test_couple_with_three_children() {
    let layout = lay_out(
        vec![pair("A", "B")],
        vec![
            ChildTriple::of_couple("A", "B", "C1"),
            ChildTriple::of_couple("A", "B", "C2"),
            ChildTriple::of_couple("A", "B", "C3"),
        ],
    )
    .expect("Should lay out");

    assert_eq!(layout.row_count(), 2);
    assert_eq!(layout.rows[1].len(), 3);

    let couple = layout.couple("A", "B").expect("couple connection");
    let children: Vec<&str> = couple.children.iter().map(|c| c.as_str()).collect();
    assert_eq!(children, vec!["C1", "C2", "C3"]);
    let children_slot = couple.children_slot.expect("children slot");
    if couple.slot == 0 {
        assert_ne!(children_slot, couple.slot);
    }
}

#[test]
fn test_three_generations() {
    let layout = lay_out(
        vec![pair("A", "B"), pair("C", "D")],
        vec![
            ChildTriple::of_couple("A", "B", "C"),
            ChildTriple::of_couple("C", "D", "E"),
        ],
    )
    .expect("Should lay out");

    assert_eq!(layout.row_count(), 3);
    let (c, d, e) = (
        layout.node("C").unwrap(),
        layout.node("D").unwrap(),
        layout.node("E").unwrap(),
    );
    assert!(e.row > c.row);
    assert!(e.row > d.row);
    assert_eq!(c.row, d.row);
    assert_eq!(c.column.abs_diff(d.column), 1, "C and D should be adjacent");
}

#[test]
fn test_single_parent_connection() {
    let layout = lay_out(vec![], vec![ChildTriple::of_single("A", "C")]).expect("Should lay out");

    assert_eq!(layout.connections.len(), 1);
    match &layout.connections[0] {
        Connection::SingleParent(s) => {
            assert_eq!(s.id1.as_str(), "A");
            assert_eq!(s.children, vec![PersonId::from("C")]);
        }
        other => panic!("expected a single-parent connection, got {:?}", other),
    }
    assert!(layout.couple("A", "C").is_none());
}

#[test]
fn test_self_mating_fails() {
    let err = lay_out(vec![pair("A", "A")], vec![]).unwrap_err();
    assert!(matches!(
        err,
        LayoutError::SelfRelation {
            kind: SelfRelationKind::Mate,
            ..
        }
    ));
    assert!(MatePair::new("A", "A").is_err());
}

#[test]
fn test_node_lookup() {
    let layout = lay_out(vec![pair("A", "B")], vec![]).expect("Should lay out");
    let a = layout.node_for(&PersonId::from("A")).expect("A is placed");
    assert_eq!(a.row, 0);
    assert!(layout.node("nobody").is_none());
}

#[test]
fn test_child_with_two_families() {
    // X has children with two different partners
    let layout = lay_out(
        vec![pair("X", "Y"), pair("X", "Z")],
        vec![
            ChildTriple::of_couple("X", "Y", "K1"),
            ChildTriple::of_couple("X", "Z", "K2"),
        ],
    )
    .expect("Should lay out");

    assert_eq!(row_ids(&layout, 0).len(), 3);
    let xy = layout.couple("X", "Y").unwrap();
    let xz = layout.couple("X", "Z").unwrap();
    assert_ne!(xy.slot, xz.slot, "both mate links pass over X");
    assert_eq!(xy.children, vec![PersonId::from("K1")]);
    assert_eq!(xz.children, vec![PersonId::from("K2")]);
}
