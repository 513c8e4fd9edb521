//! Concurrency and whole-tree invariant tests for the placement engine.
//!
//! Many allocations race against one shared store; the capacity invariant
//! (`child_count <= max_children`) must hold no matter who wins.
//!
//! Run with: cargo test --test concurrency

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use rayon::prelude::*;

use refnet::store::{MemoryStore, NodeStore};
use refnet::{Config, PlacementEngine, RegistrationMode, Registry, Scope, MAX_DEPTH, MAX_FANOUT};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// The default retry ceiling assumes modest contention; these tests
/// deliberately oversubscribe one parent, so give losers more room.
fn contended_config() -> Config {
    Config {
        max_capacity_retries: 256,
        ..Config::default()
    }
}

#[test]
fn at_most_capacity_many_allocations_win_the_same_parent() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let engine =
        PlacementEngine::new(store.clone(), store.clone()).with_config(contended_config());
    let root = store.root_id();

    // A fresh node with all five slots free.
    let anchor = engine.allocate_parent(root, Scope::File).unwrap().node;

    let winners: DashMap<_, u64> = DashMap::new();

    (0..40usize).into_par_iter().for_each(|_| {
        let assignment = engine.allocate_parent(anchor.id, Scope::File).unwrap();

        *winners.entry(assignment.parent_id).or_insert(0) += 1;
    });

    // Exactly five of the forty racing allocations selected the anchor; the
    // rest observed it as Full and spilled into its file.
    assert_eq!(
        winners.get(&anchor.id).map(|count| *count),
        Some(MAX_FANOUT as u64)
    );

    let live = store.get_node(anchor.id).unwrap();
    assert_eq!(live.child_count, live.max_children);
}

#[test]
fn tree_invariants_hold_under_concurrent_growth() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let engine =
        PlacementEngine::new(store.clone(), store.clone()).with_config(contended_config());
    let root = store.root_id();

    let placed: Vec<_> = (0..300usize)
        .into_par_iter()
        .map(|i| {
            let scope = if i % 3 == 0 {
                Scope::File
            } else {
                Scope::Network
            };

            engine.allocate_parent(root, scope).unwrap().node
        })
        .collect();

    assert_eq!(store.node_count(), 301);

    // Count structural children per parent.
    let mut children_of: HashMap<_, u8> = HashMap::new();
    for node in &placed {
        *children_of.entry(node.parent_id.unwrap()).or_insert(0) += 1;
    }

    let mut run_numbers = Vec::new();

    for node in placed.iter() {
        let live = store.get_node(node.id).unwrap();

        assert!(live.child_count <= live.max_children);
        assert!(live.depth <= MAX_DEPTH);
        assert_eq!(
            live.child_count,
            children_of.get(&live.id).copied().unwrap_or(0)
        );

        let parent = store.get_node(live.parent_id.unwrap()).unwrap();
        assert_eq!(live.depth, parent.depth + 1);

        run_numbers.push(live.run_number);
    }

    // Assigned once, never reused.
    run_numbers.sort_unstable();
    let before = run_numbers.len();
    run_numbers.dedup();
    assert_eq!(run_numbers.len(), before);

    let root_live = store.get_node(root).unwrap();
    assert_eq!(
        root_live.child_count,
        children_of.get(&root).copied().unwrap_or(0)
    );
}

#[test]
fn registry_handles_are_cloneable_across_threads() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let registry = Registry::builder().build(store.clone(), store.clone());

    (0..64usize).into_par_iter().for_each(|_| {
        let handle = registry.clone();

        handle
            .register(RegistrationMode::Nic, Scope::Network)
            .unwrap();
    });

    assert_eq!(registry.info().unwrap().node_count, 65);

    registry.shutdown();
}
