//! Data model shared across the crate.

mod depth;
mod id;
mod node;
mod owner_index;

pub use depth::{can_accept_child, max_subtree_size, MAX_DEPTH};
pub use id::{NodeId, RunNumber};
pub use node::{Node, NodeStatus, MAX_FANOUT, ROOT_FANOUT};
pub use owner_index::IndexEntry;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Candidate breadth of a placement search.
pub enum Scope {
    /// The owner plus the owner's recorded children only. Cheap and bounded;
    /// if all of them are Full the placement fails even when deeper Open
    /// nodes exist elsewhere. A deliberate shallow-first policy.
    File,
    /// Full breadth-first traversal of the owner's subtree.
    Network,
}
