#![doc = include_str!("../README.md")]

// Public modules
mod common;
mod error;
mod registry;

pub mod aggregate;
pub mod engine;
pub mod store;

pub use crate::common::{
    can_accept_child, max_subtree_size, IndexEntry, Node, NodeId, NodeStatus, RunNumber, Scope,
    MAX_DEPTH, MAX_FANOUT, ROOT_FANOUT,
};
pub use crate::engine::{Config, ParentAssignment, PlacementEngine};
pub use crate::error::{AggregateError, PlacementError, RegistryError, StoreError};
pub use crate::registry::{Info, RegistrationMode, Registry, RegistryBuilder};

pub use crate::aggregate::{NetworkAggregator, NetworkReport};
