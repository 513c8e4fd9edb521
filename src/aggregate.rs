//! Bounded-depth subtree membership and financial aggregates.

use std::collections::{HashSet, VecDeque};
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::common::{NodeId, MAX_DEPTH};
use crate::error::AggregateError;
use crate::store::{Ledger, NodeStore};

/// Default number of subtree snapshots kept by the aggregator.
pub const DEFAULT_SUBTREE_CACHE_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// One member of a computed subtree.
pub struct SubtreeMember {
    pub id: NodeId,
    /// Depth relative to the queried subtree root.
    pub depth: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Membership and completed-order aggregates over one subtree, in exact base
/// currency units.
pub struct NetworkReport {
    pub member_count: u64,
    pub seller_count: u64,
    pub order_count: u64,
    pub total_sales: u64,
    pub total_fees: u64,
}

#[derive(Debug)]
/// Read-only reporting over subtrees of the placement tree.
///
/// Never mutates the tree; placement stays with the engine.
pub struct NetworkAggregator {
    store: Arc<dyn NodeStore>,
    ledger: Arc<dyn Ledger>,
    /// Subtree snapshots keyed by `(root, max_depth, node count)`. The tree
    /// is append-only, so the store's node count is a valid fingerprint.
    cache: Mutex<LruCache<(NodeId, u8, u64), Arc<[SubtreeMember]>>>,
}

impl NetworkAggregator {
    pub fn new(store: Arc<dyn NodeStore>, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            store,
            ledger,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(DEFAULT_SUBTREE_CACHE_SIZE).expect("infallible"),
            )),
        }
    }

    // === Options ===

    pub fn with_cache_size(self, size: NonZeroUsize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(size)),
            ..self
        }
    }

    // === Public Methods ===

    /// The members of `root`'s subtree down to `max_depth` levels below it,
    /// in breadth-first order, each id listed once.
    ///
    /// The visited-set guard also protects against malformed or cyclic
    /// parent pointers; they should not occur by construction but must not
    /// hang the traversal.
    pub fn compute_subtree(
        &self,
        root: NodeId,
        max_depth: u8,
    ) -> Result<Arc<[SubtreeMember]>, AggregateError> {
        let fingerprint = self.store.node_count() as u64;
        let key = (root, max_depth, fingerprint);

        if let Some(members) = self.cache.lock().get(&key) {
            trace!(?root, max_depth, "Subtree cache hit");
            return Ok(members.clone());
        }

        if self.store.get_node(root).is_none() {
            return Err(AggregateError::UnknownRoot(root));
        }

        let mut members = Vec::new();
        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();

        visited.insert(root);
        queue.push_back(SubtreeMember { id: root, depth: 0 });

        while let Some(member) = queue.pop_front() {
            if member.depth < max_depth {
                for entry in self.store.get_children(member.id) {
                    if visited.contains(&entry.child_id) {
                        continue;
                    }

                    if let Some(child) = self.store.get_node(entry.child_id) {
                        // Invitor-side index entries can point outside the
                        // structural subtree; follow parent edges only.
                        if child.parent_id == Some(member.id) {
                            visited.insert(child.id);
                            queue.push_back(SubtreeMember {
                                id: child.id,
                                depth: member.depth + 1,
                            });
                        }
                    }
                }
            }

            members.push(member);
        }

        let members: Arc<[SubtreeMember]> = members.into();

        self.cache.lock().put(key, members.clone());

        Ok(members)
    }

    /// Membership and completed-order aggregates for `root`'s subtree.
    ///
    /// Pure over the tree and ledger snapshots; sums are exact base currency
    /// units, rounding belongs to display boundaries.
    pub fn aggregate_financials(&self, root: NodeId) -> Result<NetworkReport, AggregateError> {
        let members = self.compute_subtree(root, MAX_DEPTH)?;

        let seller_ids: HashSet<NodeId> = members.iter().map(|member| member.id).collect();
        let orders = self.ledger.completed_order_aggregates(&seller_ids);

        Ok(NetworkReport {
            member_count: members.len() as u64,
            seller_count: orders.seller_count,
            order_count: orders.order_count,
            total_sales: orders.total_amount,
            total_fees: orders.total_fee,
        })
    }
}
