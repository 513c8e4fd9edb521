//! Collaborator contracts the engine consumes, and in-memory reference
//! implementations.
//!
//! The engine never assumes a persistence technology; it talks to these
//! traits. Durable backends implement them over their own storage, the
//! in-memory implementations back tests and embedded use.

mod memory;

use std::collections::HashSet;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::common::{IndexEntry, Node, NodeId, RunNumber};
use crate::error::StoreError;

pub use memory::{MemoryLedger, MemoryStore, OrderRecord, OrderStatus};

/// Read/write access to tree nodes and per-owner child indexes.
///
/// The tree is append-only: nodes are created once and only ever mutated by
/// incrementing their child count. No deletion, no re-parenting.
pub trait NodeStore: Send + Sync + Debug {
    /// The single node with no parent.
    fn root_id(&self) -> NodeId;

    fn get_node(&self, id: NodeId) -> Option<Node>;

    /// The owner's child index, in append order.
    fn get_children(&self, owner: NodeId) -> Vec<IndexEntry>;

    /// Create a node under `parent_id`. The store assigns the id and the
    /// placement timestamp, and derives `depth = parent.depth + 1`.
    ///
    /// Must be preceded by a successful [Self::increment_child_count] on the
    /// parent; the reservation is the commit point, creation itself must not
    /// fail for a reserved slot.
    fn create_node(
        &self,
        parent_id: NodeId,
        invitor_id: NodeId,
        run_number: RunNumber,
    ) -> Result<Node, StoreError>;

    /// Atomic compare-and-increment of a node's child count.
    ///
    /// Returns the new count, or [StoreError::CapacityConflict] when the node
    /// is already at `max_children`. Atomic with respect to its own
    /// invariant: two racing callers can never push the count past capacity.
    fn increment_child_count(&self, id: NodeId) -> Result<u8, StoreError>;

    /// Append an entry to the owner's child index.
    fn append_child(&self, owner: NodeId, entry: IndexEntry) -> Result<(), StoreError>;

    /// Total number of nodes. Because the tree is append-only this also
    /// serves as a cheap snapshot fingerprint for read-side caches.
    fn node_count(&self) -> usize;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Completed-order aggregates for a set of sellers, in exact base currency
/// units. Rounding belongs to display boundaries, never to aggregation.
pub struct OrderAggregates {
    pub order_count: u64,
    /// Distinct sellers with at least one completed order.
    pub seller_count: u64,
    pub total_amount: u64,
    pub total_fee: u64,
}

/// Read access to completed-order aggregates, restricted to a seller id set.
pub trait Ledger: Send + Sync + Debug {
    fn completed_order_aggregates(&self, seller_ids: &HashSet<NodeId>) -> OrderAggregates;
}

/// Authority handing out globally unique, monotonically increasing run
/// numbers.
pub trait RunNumberAuthority: Send + Sync + Debug {
    fn next_run_number(&self) -> RunNumber;
}
