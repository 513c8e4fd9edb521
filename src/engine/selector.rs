//! Scoped generation of placement candidates.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::trace;

use crate::common::{Node, NodeId, Scope};
use crate::engine::OpenCandidates;
use crate::error::PlacementError;
use crate::store::NodeStore;

#[derive(Debug, Clone)]
/// Generates and orders the set of placement candidates for a given owner
/// and [Scope].
pub struct CandidateSelector {
    store: Arc<dyn NodeStore>,
}

impl CandidateSelector {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self { store }
    }

    // === Public Methods ===

    /// Generate the Open candidates for `owner` within `scope`.
    ///
    /// `budget` bounds the number of nodes a NETWORK-scope traversal may
    /// visit; exceeding it fails with [PlacementError::AllocationTimeout]
    /// rather than hanging on a degenerate tree.
    pub fn candidates(
        &self,
        owner: NodeId,
        scope: Scope,
        budget: usize,
    ) -> Result<OpenCandidates, PlacementError> {
        let owner_node = self
            .store
            .get_node(owner)
            .ok_or(PlacementError::InvalidInvitor(owner))?;

        let mut candidates = OpenCandidates::new();

        match scope {
            Scope::File => {
                // The owner plus its recorded children, nothing deeper. When
                // all of them are Full the caller sees NoOpenParent even if
                // Open nodes exist further down.
                candidates.add(owner_node);

                for entry in self.store.get_children(owner) {
                    if let Some(child) = self.store.get_node(entry.child_id) {
                        candidates.add(child);
                    }
                }
            }
            Scope::Network => {
                self.walk_subtree(owner_node, budget, |node| candidates.add(node))?;
            }
        }

        trace!(
            ?owner,
            ?scope,
            candidates = candidates.len(),
            "Generated placement candidates"
        );

        Ok(candidates)
    }

    // === Private Methods ===

    /// Breadth-first traversal of the owner's structural subtree, each node
    /// visited once. Shallower nodes are discovered before deeper ones.
    fn walk_subtree(
        &self,
        owner: Node,
        budget: usize,
        mut visit: impl FnMut(Node),
    ) -> Result<(), PlacementError> {
        let owner_id = owner.id;

        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();
        let mut visits = 0usize;

        visited.insert(owner_id);
        queue.push_back(owner);

        while let Some(current) = queue.pop_front() {
            visits += 1;

            if visits > budget {
                trace!(?owner_id, budget, "Subtree traversal exceeded its budget");
                return Err(PlacementError::AllocationTimeout);
            }

            for entry in self.store.get_children(current.id) {
                if visited.contains(&entry.child_id) {
                    continue;
                }

                if let Some(child) = self.store.get_node(entry.child_id) {
                    // An index entry under an invitor may point outside the
                    // structural subtree; follow parent edges only.
                    if child.parent_id == Some(current.id) {
                        visited.insert(child.id);
                        queue.push_back(child);
                    }
                }
            }

            visit(current);
        }

        Ok(())
    }
}
