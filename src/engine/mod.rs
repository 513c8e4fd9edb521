//! Deterministic candidate selection and capacity-safe placement commit.

mod config;
mod open_candidates;
mod selector;

pub use config::{
    Config, DEFAULT_ALLOCATION_TIMEOUT, DEFAULT_MAX_CAPACITY_RETRIES, DEFAULT_TRAVERSAL_BUDGET,
};
pub use open_candidates::OpenCandidates;
pub use selector::CandidateSelector;

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::common::{can_accept_child, IndexEntry, Node, NodeId, Scope};
use crate::error::{PlacementError, StoreError};
use crate::store::{NodeStore, RunNumberAuthority};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A committed placement.
pub struct ParentAssignment {
    /// The newly created node.
    pub node: Node,
    pub parent_id: NodeId,
    /// The parent's child count right after the commit.
    pub parent_child_count: u8,
}

#[derive(Debug, Clone)]
/// Orchestrates candidate selection and the capacity-safe commit of a new
/// registrant under an open parent.
pub struct PlacementEngine {
    store: Arc<dyn NodeStore>,
    runs: Arc<dyn RunNumberAuthority>,
    selector: CandidateSelector,
    config: Config,
}

impl PlacementEngine {
    pub fn new(store: Arc<dyn NodeStore>, runs: Arc<dyn RunNumberAuthority>) -> Self {
        let selector = CandidateSelector::new(store.clone());

        Self {
            store,
            runs,
            selector,
            config: Config::default(),
        }
    }

    // === Options ===

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    // === Getters ===

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }

    // === Public Methods ===

    /// Place a new registrant under the first Open candidate within `scope`,
    /// searching from `invitor`.
    ///
    /// Safe under concurrency: losing a capacity race against another
    /// allocation triggers reselection over a fresh snapshot, bounded by
    /// [Config::max_capacity_retries] and [Config::allocation_timeout].
    /// Raw capacity conflicts are never surfaced, and an exhausted scope is
    /// reported only once reselection confirms it.
    pub fn allocate_parent(
        &self,
        invitor: NodeId,
        scope: Scope,
    ) -> Result<ParentAssignment, PlacementError> {
        let deadline = Instant::now() + self.config.allocation_timeout;

        let mut scope_exhausted = false;

        for attempt in 0..=self.config.max_capacity_retries {
            if Instant::now() >= deadline {
                debug!(?invitor, attempt, "Allocation deadline exceeded");
                return Err(PlacementError::AllocationTimeout);
            }

            let candidates =
                self.selector
                    .candidates(invitor, scope, self.config.traversal_budget)?;

            let parent = match candidates.first() {
                Some(parent) => parent.clone(),
                None => {
                    // A racing commit increments the winner's child count
                    // before its index entry lands, so a torn read can look
                    // like exhaustion. Reselect before trusting it.
                    trace!(?invitor, ?scope, attempt, "No open candidate, reselecting");
                    scope_exhausted = true;
                    continue;
                }
            };

            scope_exhausted = false;

            match self.commit(&parent, invitor) {
                Ok(assignment) => {
                    debug!(
                        node = ?assignment.node.id,
                        parent = ?assignment.parent_id,
                        ?scope,
                        attempt,
                        "Placed registrant"
                    );

                    return Ok(assignment);
                }
                Err(StoreError::CapacityConflict { id, child_count }) => {
                    // Lost the race for this parent; another allocation took
                    // the last slot between selection and commit.
                    trace!(parent = ?id, child_count, attempt, "Capacity conflict, reselecting");
                }
                Err(StoreError::NodeNotFound(id) | StoreError::DuplicateNode(id)) => {
                    trace!(parent = ?id, attempt, "Stale snapshot at commit, reselecting");
                }
                Err(StoreError::DepthLimitExceeded { depth, .. }) => {
                    return Err(PlacementError::DepthLimitExceeded(depth));
                }
            }
        }

        if scope_exhausted {
            return Err(PlacementError::NoOpenParent(scope));
        }

        debug!(?invitor, "Capacity-conflict retry ceiling exceeded");

        Err(PlacementError::AllocationTimeout)
    }

    // === Private Methods ===

    /// All-or-nothing commit against the chosen parent.
    ///
    /// The atomic child-count reservation is the commit point; every effect
    /// after it is an infallible append for a reserved slot, so a partially
    /// applied placement is never observable.
    fn commit(&self, parent: &Node, invitor: NodeId) -> Result<ParentAssignment, StoreError> {
        let live = self
            .store
            .get_node(parent.id)
            .ok_or(StoreError::NodeNotFound(parent.id))?;

        // Re-checked against the live node so a stale snapshot can never
        // produce an assignment below the depth ceiling.
        if !can_accept_child(live.depth) {
            return Err(StoreError::DepthLimitExceeded {
                id: live.id,
                depth: live.depth,
            });
        }

        let parent_child_count = self.store.increment_child_count(parent.id)?;

        let run_number = self.runs.next_run_number();
        let node = self.store.create_node(parent.id, invitor, run_number)?;

        let entry = IndexEntry {
            child_id: node.id,
            created_at: node.created_at,
            child_count_at_insert: parent_child_count,
            run_number,
        };

        self.store.append_child(parent.id, entry.clone())?;
        if invitor != parent.id {
            // The invitor-side entry keeps spilled placements visible to
            // FILE-scoped searches rooted at the invitor.
            self.store.append_child(invitor, entry)?;
        }

        Ok(ParentAssignment {
            node,
            parent_id: parent.id,
            parent_child_count,
        })
    }
}
