//! Ordered set of Open placement candidates.

use std::vec::IntoIter;

use crate::common::Node;

#[derive(Debug, Clone, Default)]
/// Placement candidates kept sorted by the ascending lexicographic key
/// `(created_at, child_count, run_number)`: earliest-registered Open node
/// first (keeps the tree left-balanced and chronologically fair), then
/// least-loaded, then a stable numeric tiebreak guaranteeing a total order,
/// so repeated selection over identical input never flip-flops.
pub struct OpenCandidates {
    nodes: Vec<Node>,
}

impl OpenCandidates {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    // === Getters ===

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The chosen parent: the first candidate in sort order.
    pub fn first(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // === Public Methods ===

    /// Insert a node at its sorted position, skipping nodes that are not
    /// Open and ids that are already present.
    pub fn add(&mut self, node: Node) {
        if !node.is_open() {
            return;
        }

        let seek = node.sort_key();

        match self.nodes.binary_search_by(|probe| {
            if probe.id == node.id {
                std::cmp::Ordering::Equal
            } else {
                probe.sort_key().cmp(&seek)
            }
        }) {
            Err(position) => self.nodes.insert(position, node),
            Ok(_) => {}
        }
    }
}

impl IntoIterator for OpenCandidates {
    type Item = Node;
    type IntoIter = IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a OpenCandidates {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::{NodeId, RunNumber, MAX_DEPTH, MAX_FANOUT};

    fn node(created_at: u64, child_count: u8, run_number: RunNumber) -> Node {
        Node {
            id: NodeId::random(),
            parent_id: Some(NodeId::random()),
            invitor_id: None,
            created_at,
            child_count,
            max_children: MAX_FANOUT,
            depth: 1,
            run_number,
        }
    }

    #[test]
    fn ordering_law() {
        let mut candidates = OpenCandidates::new();

        // Inserted out of order on purpose.
        candidates.add(node(30, 0, 7));
        candidates.add(node(10, 2, 4));
        candidates.add(node(20, 1, 5));
        candidates.add(node(10, 2, 3));
        candidates.add(node(10, 0, 6));
        candidates.add(node(20, 1, 2));

        let keys: Vec<_> = candidates.nodes().iter().map(|n| n.sort_key()).collect();

        let mut sorted = keys.clone();
        sorted.sort();

        assert_eq!(keys, sorted);
        assert_eq!(candidates.first().map(|n| n.run_number), Some(6));
    }

    #[test]
    fn deduplicates_by_id() {
        let mut candidates = OpenCandidates::new();

        let node = node(1, 0, 1);

        candidates.add(node.clone());
        candidates.add(node);

        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn rejects_full_nodes() {
        let mut candidates = OpenCandidates::new();

        candidates.add(node(1, MAX_FANOUT, 1));

        let mut deep = node(2, 0, 2);
        deep.depth = MAX_DEPTH;
        candidates.add(deep);

        assert!(candidates.is_empty());
    }

    #[test]
    fn identical_input_identical_output() {
        let pool = [node(5, 1, 9), node(3, 2, 4), node(5, 0, 2), node(1, 4, 7)];

        let mut a = OpenCandidates::new();
        let mut b = OpenCandidates::new();

        for n in pool.iter() {
            a.add(n.clone());
        }
        for n in pool.iter().rev() {
            b.add(n.clone());
        }

        assert_eq!(
            a.nodes().iter().map(|n| n.id).collect::<Vec<_>>(),
            b.nodes().iter().map(|n| n.id).collect::<Vec<_>>()
        );
    }
}
