//! Per-owner append-only index of known children.

use serde::{Deserialize, Serialize};

use crate::common::{NodeId, RunNumber};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One entry in an owner's child index.
///
/// Two entries are written per placement: one under the chosen parent and,
/// when the search spilled past the invitor's own slots, one under the
/// original invitor. The invitor-side entry lets a FILE-scoped search rooted
/// at the invitor see such grandchildren without a tree walk.
pub struct IndexEntry {
    pub child_id: NodeId,
    /// The child's placement timestamp, Unix milliseconds.
    pub created_at: u64,
    /// The owner's child count right after this entry was appended.
    pub child_count_at_insert: u8,
    /// The child's run number.
    pub run_number: RunNumber,
}
