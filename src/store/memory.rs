//! In-memory reference implementations of the collaborator contracts.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::common::{
    can_accept_child, IndexEntry, Node, NodeId, RunNumber, MAX_FANOUT, ROOT_FANOUT,
};
use crate::error::StoreError;
use crate::store::{Ledger, NodeStore, OrderAggregates, RunNumberAuthority};

#[derive(Debug)]
/// In-memory [NodeStore] and [RunNumberAuthority].
///
/// Created with the single root node already in place.
pub struct MemoryStore {
    root: NodeId,
    nodes: RwLock<HashMap<NodeId, Node>>,
    children: RwLock<HashMap<NodeId, Vec<IndexEntry>>>,
    runs: AtomicU64,
    /// Last issued placement timestamp, kept strictly increasing so that
    /// `created_at` is a usable ordering key even within one millisecond.
    clock: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        let root = NodeId::random();

        let store = MemoryStore {
            root,
            nodes: RwLock::new(HashMap::new()),
            children: RwLock::new(HashMap::new()),
            runs: AtomicU64::new(0),
            clock: AtomicU64::new(0),
        };

        store.nodes.write().insert(
            root,
            Node {
                id: root,
                parent_id: None,
                invitor_id: None,
                created_at: store.stamp(),
                child_count: 0,
                max_children: ROOT_FANOUT,
                depth: 0,
                run_number: 0,
            },
        );

        store
    }

    // === Public Methods ===

    /// Insert a fully formed node, bypassing placement. Backfill and test
    /// helper; the caller is responsible for the tree invariants.
    pub fn seed_node(&self, node: Node) -> Result<(), StoreError> {
        let mut nodes = self.nodes.write();

        if nodes.contains_key(&node.id) {
            return Err(StoreError::DuplicateNode(node.id));
        }

        nodes.insert(node.id, node);

        Ok(())
    }

    // === Private Methods ===

    /// Unix milliseconds, strictly greater than any previously issued stamp.
    fn stamp(&self) -> u64 {
        let now = now_ms();
        let mut prev = self.clock.load(Ordering::Relaxed);

        loop {
            let next = now.max(prev + 1);

            match self
                .clock
                .compare_exchange(prev, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(seen) => prev = seen,
            }
        }
    }

    fn unused_id(&self, nodes: &HashMap<NodeId, Node>) -> NodeId {
        loop {
            let id = NodeId::random();

            if !nodes.contains_key(&id) {
                return id;
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore for MemoryStore {
    fn root_id(&self) -> NodeId {
        self.root
    }

    fn get_node(&self, id: NodeId) -> Option<Node> {
        self.nodes.read().get(&id).cloned()
    }

    fn get_children(&self, owner: NodeId) -> Vec<IndexEntry> {
        self.children
            .read()
            .get(&owner)
            .cloned()
            .unwrap_or_default()
    }

    fn create_node(
        &self,
        parent_id: NodeId,
        invitor_id: NodeId,
        run_number: RunNumber,
    ) -> Result<Node, StoreError> {
        let mut nodes = self.nodes.write();

        let parent = nodes
            .get(&parent_id)
            .ok_or(StoreError::NodeNotFound(parent_id))?;

        if !can_accept_child(parent.depth) {
            return Err(StoreError::DepthLimitExceeded {
                id: parent_id,
                depth: parent.depth,
            });
        }

        let depth = parent.depth + 1;
        let id = self.unused_id(&nodes);

        let node = Node {
            id,
            parent_id: Some(parent_id),
            invitor_id: Some(invitor_id),
            created_at: self.stamp(),
            child_count: 0,
            max_children: MAX_FANOUT,
            depth,
            run_number,
        };

        nodes.insert(id, node.clone());

        Ok(node)
    }

    fn increment_child_count(&self, id: NodeId) -> Result<u8, StoreError> {
        let mut nodes = self.nodes.write();

        let node = nodes.get_mut(&id).ok_or(StoreError::NodeNotFound(id))?;

        if node.child_count >= node.max_children {
            return Err(StoreError::CapacityConflict {
                id,
                child_count: node.child_count,
            });
        }

        node.child_count += 1;

        Ok(node.child_count)
    }

    fn append_child(&self, owner: NodeId, entry: IndexEntry) -> Result<(), StoreError> {
        if !self.nodes.read().contains_key(&owner) {
            return Err(StoreError::NodeNotFound(owner));
        }

        self.children.write().entry(owner).or_default().push(entry);

        Ok(())
    }

    fn node_count(&self) -> usize {
        self.nodes.read().len()
    }
}

impl RunNumberAuthority for MemoryStore {
    fn next_run_number(&self) -> RunNumber {
        self.runs.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One order as the ledger sees it. Amounts are exact base currency units.
pub struct OrderRecord {
    pub seller: NodeId,
    pub amount: u64,
    /// Community fee carved out of the amount.
    pub fee: u64,
    pub status: OrderStatus,
}

#[derive(Debug, Default)]
/// In-memory [Ledger].
pub struct MemoryLedger {
    orders: RwLock<Vec<OrderRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, order: OrderRecord) {
        self.orders.write().push(order);
    }
}

impl Ledger for MemoryLedger {
    fn completed_order_aggregates(&self, seller_ids: &HashSet<NodeId>) -> OrderAggregates {
        let orders = self.orders.read();

        let mut aggregates = OrderAggregates::default();
        let mut sellers = HashSet::new();

        for order in orders.iter() {
            if order.status != OrderStatus::Completed || !seller_ids.contains(&order.seller) {
                continue;
            }

            aggregates.order_count += 1;
            aggregates.total_amount = aggregates.total_amount.saturating_add(order.amount);
            aggregates.total_fee = aggregates.total_fee.saturating_add(order.fee);
            sellers.insert(order.seller);
        }

        aggregates.seller_count = sellers.len() as u64;

        aggregates
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::MAX_DEPTH;

    #[test]
    fn starts_with_a_single_root() {
        let store = MemoryStore::new();

        let root = store.get_node(store.root_id()).unwrap();

        assert_eq!(store.node_count(), 1);
        assert_eq!(root.parent_id, None);
        assert_eq!(root.depth, 0);
        assert_eq!(root.max_children, ROOT_FANOUT);
    }

    #[test]
    fn increment_is_bounded_by_capacity() {
        let store = MemoryStore::new();
        let root = store.root_id();

        assert_eq!(store.increment_child_count(root), Ok(1));
        assert_eq!(
            store.increment_child_count(root),
            Err(StoreError::CapacityConflict {
                id: root,
                child_count: 1
            })
        );
    }

    #[test]
    fn run_numbers_are_monotonic() {
        let store = MemoryStore::new();

        let a = store.next_run_number();
        let b = store.next_run_number();

        assert!(b > a);
    }

    #[test]
    fn created_at_is_strictly_increasing() {
        let store = MemoryStore::new();
        let root = store.root_id();

        store.increment_child_count(root).unwrap();
        let a = store.create_node(root, root, 1).unwrap();

        store.increment_child_count(a.id).unwrap();
        let b = store.create_node(a.id, root, 2).unwrap();

        assert!(b.created_at > a.created_at);
    }

    #[test]
    fn create_derives_depth_from_parent() {
        let store = MemoryStore::new();
        let root = store.root_id();

        store.increment_child_count(root).unwrap();
        let child = store.create_node(root, root, 1).unwrap();

        assert_eq!(child.depth, 1);
        assert_eq!(child.parent_id, Some(root));
        assert_eq!(child.max_children, MAX_FANOUT);
    }

    #[test]
    fn create_refuses_the_depth_ceiling() {
        let store = MemoryStore::new();

        let deep = Node {
            id: NodeId::random(),
            parent_id: Some(store.root_id()),
            invitor_id: None,
            created_at: 1,
            child_count: 0,
            max_children: MAX_FANOUT,
            depth: MAX_DEPTH,
            run_number: 1,
        };
        store.seed_node(deep.clone()).unwrap();

        assert_eq!(
            store.create_node(deep.id, deep.id, 2),
            Err(StoreError::DepthLimitExceeded {
                id: deep.id,
                depth: MAX_DEPTH
            })
        );
    }

    #[test]
    fn ledger_aggregates_completed_orders_only() {
        let ledger = MemoryLedger::new();

        let seller = NodeId::from_u64(1);
        let other = NodeId::from_u64(2);
        let outsider = NodeId::from_u64(3);

        ledger.record(OrderRecord {
            seller,
            amount: 100,
            fee: 10,
            status: OrderStatus::Completed,
        });
        ledger.record(OrderRecord {
            seller,
            amount: 50,
            fee: 5,
            status: OrderStatus::Completed,
        });
        ledger.record(OrderRecord {
            seller: other,
            amount: 30,
            fee: 3,
            status: OrderStatus::Pending,
        });
        ledger.record(OrderRecord {
            seller: outsider,
            amount: 1000,
            fee: 100,
            status: OrderStatus::Completed,
        });

        let members: HashSet<NodeId> = [seller, other].iter().copied().collect();
        let aggregates = ledger.completed_order_aggregates(&members);

        assert_eq!(
            aggregates,
            OrderAggregates {
                order_count: 2,
                seller_count: 1,
                total_amount: 150,
                total_fee: 15,
            }
        );
    }
}
