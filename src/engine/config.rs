use std::time::Duration;

use crate::common::max_subtree_size;

/// Default hard cap on nodes visited by a NETWORK-scope traversal.
///
/// Matches the derived maximum subtree size, so a well-formed tree can always
/// be searched in full.
pub const DEFAULT_TRAVERSAL_BUDGET: usize = max_subtree_size();

/// Default ceiling on capacity-conflict reselections per allocation.
pub const DEFAULT_MAX_CAPACITY_RETRIES: usize = 8;

/// Default wall-clock deadline for a single allocation.
pub const DEFAULT_ALLOCATION_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
/// Placement engine configurations.
pub struct Config {
    /// Maximum number of nodes a NETWORK-scope search may visit before the
    /// allocation fails with
    /// [AllocationTimeout][crate::PlacementError::AllocationTimeout].
    ///
    /// Defaults to [DEFAULT_TRAVERSAL_BUDGET]
    pub traversal_budget: usize,
    /// Maximum number of times one allocation re-runs candidate selection
    /// after losing a capacity race, before giving up with
    /// [AllocationTimeout][crate::PlacementError::AllocationTimeout].
    ///
    /// Defaults to [DEFAULT_MAX_CAPACITY_RETRIES]
    pub max_capacity_retries: usize,
    /// Wall-clock deadline for one allocation, selection and commit included.
    ///
    /// Defaults to [DEFAULT_ALLOCATION_TIMEOUT]
    pub allocation_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            traversal_budget: DEFAULT_TRAVERSAL_BUDGET,
            max_capacity_retries: DEFAULT_MAX_CAPACITY_RETRIES,
            allocation_timeout: DEFAULT_ALLOCATION_TIMEOUT,
        }
    }
}
