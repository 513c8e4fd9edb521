//! One registrant's position in the placement tree.

use serde::{Deserialize, Serialize};

use crate::common::{can_accept_child, NodeId, RunNumber};

/// Maximum number of children of every node except the root.
pub const MAX_FANOUT: u8 = 5;

/// The root accepts a single child.
pub const ROOT_FANOUT: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One registrant's position in the placement tree.
pub struct Node {
    pub id: NodeId,
    /// `None` only for the single root of the tree.
    pub parent_id: Option<NodeId>,
    /// The invitor named at registration. May differ from [Self::parent_id]
    /// when the placement search spilled past the invitor's own slots.
    pub invitor_id: Option<NodeId>,
    /// Unix milliseconds at placement time. Primary candidate-ordering key.
    pub created_at: u64,
    pub child_count: u8,
    /// [ROOT_FANOUT] for the root, [MAX_FANOUT] otherwise.
    pub max_children: u8,
    /// 0 for the root, `parent.depth + 1` otherwise. Never changes.
    pub depth: u8,
    pub run_number: RunNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Capacity-and-depth-derived status of a node.
pub enum NodeStatus {
    /// Has a free child slot and is above the depth ceiling.
    Open,
    /// At capacity, or at the deepest allowed level.
    Full,
}

impl Node {
    pub fn status(&self) -> NodeStatus {
        if self.child_count < self.max_children && can_accept_child(self.depth) {
            NodeStatus::Open
        } else {
            NodeStatus::Full
        }
    }

    pub fn is_open(&self) -> bool {
        self.status() == NodeStatus::Open
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Ascending lexicographic candidate-ordering key.
    ///
    /// Earliest-registered first, then least-loaded, then the run number as a
    /// stable numeric tiebreak guaranteeing a total order, so repeated
    /// selection over the same snapshot never flip-flops between candidates.
    pub fn sort_key(&self) -> (u64, u8, RunNumber) {
        (self.created_at, self.child_count, self.run_number)
    }
}
