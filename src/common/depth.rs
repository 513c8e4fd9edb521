//! Depth ceiling of the placement tree.

use crate::common::MAX_FANOUT;

/// The deepest level a node can live at. Levels run `0..=MAX_DEPTH`,
/// so the tree has seven levels in total.
pub const MAX_DEPTH: u8 = 6;

/// Returns `true` if a node at `depth` may accept a child.
///
/// Applied while filtering candidates and again at commit time, so a stale
/// snapshot can never produce an assignment below [MAX_DEPTH].
pub fn can_accept_child(depth: u8) -> bool {
    depth < MAX_DEPTH
}

/// Maximum number of nodes a single subtree can hold, root included.
///
/// Follows from the fanout and depth bounds: `1 + 5 + 5^2 + .. + 5^6 = 19_531`.
pub const fn max_subtree_size() -> usize {
    let mut total = 0usize;
    let mut level = 1usize;
    let mut i = 0;

    while i <= MAX_DEPTH {
        total += level;
        level *= MAX_FANOUT as usize;
        i += 1;
    }

    total
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ceiling() {
        assert!(can_accept_child(0));
        assert!(can_accept_child(MAX_DEPTH - 1));
        assert!(!can_accept_child(MAX_DEPTH));
        assert!(!can_accept_child(MAX_DEPTH + 1));
    }

    #[test]
    fn derived_subtree_bound() {
        assert_eq!(max_subtree_size(), 19_531);
    }
}
