//! Main Crate Errors

use crate::common::{NodeId, Scope};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Errors of a single placement attempt.
pub enum PlacementError {
    /// No candidate passed the Open filter within the given scope.
    ///
    /// The engine never silently escalates FILE to NETWORK scope; widening
    /// the search is a caller policy, see
    /// [RegistryBuilder::network_fallback][crate::RegistryBuilder::network_fallback].
    #[error("no open parent within {0:?} scope")]
    NoOpenParent(Scope),

    /// The given invitor does not resolve to a known node.
    #[error("unknown or unreachable invitor {0:?}")]
    InvalidInvitor(NodeId),

    /// A commit would have placed a node below the depth ceiling.
    ///
    /// Unreachable given correct candidate filtering, but raised rather than
    /// silently truncated.
    #[error("node at depth {0} can not accept children")]
    DepthLimitExceeded(u8),

    /// The traversal budget, the retry ceiling, or the wall-clock deadline
    /// was exhausted before a parent could be committed.
    #[error("allocation timed out before a parent could be committed")]
    AllocationTimeout,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Errors reported by a [NodeStore][crate::store::NodeStore].
pub enum StoreError {
    #[error("node {0:?} not found")]
    NodeNotFound(NodeId),

    /// The compare-and-increment of a node's child count found the node
    /// already at capacity. Internal concurrency-retry signal; the engine
    /// consumes it and it never crosses the public placement API.
    #[error("node {id:?} is already at capacity ({child_count})")]
    CapacityConflict { id: NodeId, child_count: u8 },

    #[error("node {0:?} already exists")]
    DuplicateNode(NodeId),

    /// Creating a child here would exceed the depth ceiling.
    #[error("parent {id:?} at depth {depth} can not accept children")]
    DepthLimitExceeded { id: NodeId, depth: u8 },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Errors of a registration through the [Registry][crate::Registry].
pub enum RegistryError {
    #[error(transparent)]
    Placement(#[from] PlacementError),

    /// The registry's actor thread is gone.
    #[error("registry was shutdown")]
    RegistryWasShutdown,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Errors of subtree aggregation.
pub enum AggregateError {
    #[error("unknown subtree root {0:?}")]
    UnknownRoot(NodeId),
}
