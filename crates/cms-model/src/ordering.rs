//! Relation ordering
//!
//! Canonical order for the persisted edges of one tree:
//! - edges without a parent come first
//! - remaining edges are grouped by parent id (ascending)
//! - inside a group, ascending `position`
//! - ties broken by ascending child id
//!
//! The order depends only on the edge set, never on submission order, so
//! sorting an already sorted collection is a no-op.

use std::cmp::Ordering;

/// A parent → child edge with a display position
pub trait Edge {
    /// Node identifier type
    type NodeId: Ord + Copy;

    /// Parent node, `None` for top-level edges
    fn parent(&self) -> Option<Self::NodeId>;

    /// Child node
    fn child(&self) -> Self::NodeId;

    /// Display position among siblings
    fn position(&self) -> u32;
}

/// Compare two edges in canonical order
pub fn compare_edges<E: Edge>(a: &E, b: &E) -> Ordering {
    // `None < Some(_)` puts root edges first
    a.parent()
        .cmp(&b.parent())
        .then_with(|| a.position().cmp(&b.position()))
        .then_with(|| a.child().cmp(&b.child()))
}

/// Sort edges into canonical order
pub fn sort_relations<E: Edge>(edges: &mut [E]) {
    edges.sort_by(compare_edges);
}

/// A sibling with an explicit position (rows, columns)
pub trait Positioned {
    /// Tie-breaking identity
    type Key: Ord + Copy;

    /// Display position among siblings
    fn position(&self) -> u32;

    /// Stable identity used when positions collide
    fn key(&self) -> Self::Key;
}

/// Sort siblings by position, then identity
pub fn sort_by_position<P: Positioned>(items: &mut [P]) {
    items.sort_by(|a, b| {
        a.position()
            .cmp(&b.position())
            .then_with(|| a.key().cmp(&b.key()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct TestEdge {
        parent: Option<u64>,
        child: u64,
        position: u32,
    }

    impl Edge for TestEdge {
        type NodeId = u64;

        fn parent(&self) -> Option<u64> {
            self.parent
        }

        fn child(&self) -> u64 {
            self.child
        }

        fn position(&self) -> u32 {
            self.position
        }
    }

    fn edge(parent: Option<u64>, child: u64, position: u32) -> TestEdge {
        TestEdge {
            parent,
            child,
            position,
        }
    }

    #[test]
    fn roots_sort_before_children() {
        let mut edges = vec![edge(Some(1), 3, 0), edge(None, 1, 1), edge(None, 2, 0)];
        sort_relations(&mut edges);

        assert_eq!(
            edges,
            vec![edge(None, 2, 0), edge(None, 1, 1), edge(Some(1), 3, 0)]
        );
    }

    #[test]
    fn groups_by_parent_then_position() {
        let mut edges = vec![
            edge(Some(9), 5, 0),
            edge(Some(2), 7, 1),
            edge(Some(2), 6, 0),
            edge(Some(9), 4, 1),
        ];
        sort_relations(&mut edges);

        let children: Vec<_> = edges.iter().map(|e| e.child).collect();
        assert_eq!(children, vec![6, 7, 5, 4]);
    }

    #[test]
    fn position_ties_break_on_child_id() {
        let mut edges = vec![edge(None, 8, 0), edge(None, 3, 0)];
        sort_relations(&mut edges);

        assert_eq!(edges[0].child, 3);
        assert_eq!(edges[1].child, 8);
    }

    fn arb_edges() -> impl Strategy<Value = Vec<TestEdge>> {
        prop::collection::vec(
            (prop::option::of(0u64..6), 0u64..50, 0u32..5).prop_map(|(p, c, pos)| edge(p, c, pos)),
            0..40,
        )
    }

    proptest! {
        #[test]
        fn prop_order_independent_of_submission(edges in arb_edges()) {
            let mut forward = edges.clone();
            let mut backward: Vec<_> = edges.into_iter().rev().collect();

            sort_relations(&mut forward);
            sort_relations(&mut backward);

            prop_assert_eq!(forward, backward);
        }

        #[test]
        fn prop_sorting_twice_is_stable(edges in arb_edges()) {
            let mut once = edges;
            sort_relations(&mut once);
            let mut twice = once.clone();
            sort_relations(&mut twice);

            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_roots_precede_parented_edges(edges in arb_edges()) {
            let mut sorted = edges;
            sort_relations(&mut sorted);

            let first_parented = sorted.iter().position(|e| e.parent.is_some());
            if let Some(idx) = first_parented {
                prop_assert!(sorted[idx..].iter().all(|e| e.parent.is_some()));
            }
        }
    }
}
