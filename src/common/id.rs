//! Node Id and the global registration sequence number.
use std::fmt::{self, Debug, Formatter};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Global monotonic registration sequence number.
///
/// Assigned exactly once at placement time, never reused, and used as the
/// final tiebreak when ordering placement candidates.
pub type RunNumber = u64;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
/// Opaque identifier of a tree position.
///
/// Ids carry no ordering meaning; chronology lives in `created_at` and
/// [RunNumber].
pub struct NodeId(u64);

impl NodeId {
    /// Generate a random [NodeId].
    pub fn random() -> NodeId {
        let mut rng = rand::thread_rng();

        NodeId(rng.gen())
    }

    pub fn from_u64(id: u64) -> NodeId {
        NodeId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Debug for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({:016x})", self.0)
    }
}
