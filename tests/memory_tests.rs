//! Memory reclamation tests for avlpool.
//!
//! These tests verify that the tree frees exactly what it should: a removal
//! frees one node and hands its value back, a rejected duplicate is dropped
//! by the caller's side, and dropping or clearing the tree frees everything.
//!
//! # Test Design
//!
//! Values carry a shared drop counter. Each test performs operations and then
//! checks how many values have been dropped at each point.
//!
//! For allocator-level leak detection, run under LeakSanitizer:
//!
//! ```bash
//! RUSTFLAGS="-Zsanitizer=leak" cargo +nightly test --test memory_tests --target x86_64-unknown-linux-gnu
//! ```

use avlpool::{SharedTree, Tree};
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

// ===========================================================================
// Helper Types
// ===========================================================================

/// A value ordered by its key that counts its own drops.
#[derive(Debug)]
struct Tracked {
	key: u32,
	drops: Arc<AtomicUsize>,
}

impl Tracked {
	fn new(key: u32, drops: &Arc<AtomicUsize>) -> Self {
		Tracked {
			key,
			drops: Arc::clone(drops),
		}
	}
}

impl Drop for Tracked {
	fn drop(&mut self) {
		self.drops.fetch_add(1, Ordering::SeqCst);
	}
}

impl PartialEq for Tracked {
	fn eq(&self, other: &Self) -> bool {
		self.key == other.key
	}
}

impl Eq for Tracked {}

impl PartialOrd for Tracked {
	fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
		Some(self.cmp(other))
	}
}

impl Ord for Tracked {
	fn cmp(&self, other: &Self) -> CmpOrdering {
		self.key.cmp(&other.key)
	}
}

// ===========================================================================
// Basic Memory Tests
// ===========================================================================

#[test]
fn drop_frees_every_value() {
	let drops = Arc::new(AtomicUsize::new(0));
	let mut tree = Tree::new();
	for key in 0..1_000 {
		tree.insert(Tracked::new(key, &drops));
	}
	assert_eq!(drops.load(Ordering::SeqCst), 0);

	drop(tree);
	assert_eq!(drops.load(Ordering::SeqCst), 1_000);
}

#[test]
fn clear_frees_every_value() {
	let drops = Arc::new(AtomicUsize::new(0));
	let mut tree = Tree::new();
	for key in 0..500 {
		tree.insert(Tracked::new(key, &drops));
	}

	tree.clear();
	assert_eq!(drops.load(Ordering::SeqCst), 500);
	assert!(tree.is_empty());
}

#[test]
fn rejected_duplicate_is_dropped_once() {
	let drops = Arc::new(AtomicUsize::new(0));
	let mut tree = Tree::new();

	assert!(tree.insert(Tracked::new(1, &drops)));
	assert!(!tree.insert(Tracked::new(1, &drops)));

	// The rejected value was dropped, the stored one was not.
	assert_eq!(drops.load(Ordering::SeqCst), 1);
	assert_eq!(tree.len(), 1);
}

#[test]
fn removal_hands_back_value_without_dropping_others() {
	let drops = Arc::new(AtomicUsize::new(0));
	let mut tree = Tree::new();
	for key in [50, 30, 70, 20, 40, 60, 80] {
		tree.insert(Tracked::new(key, &drops));
	}

	// 30 has two children: its successor 40 moves up, 30 comes back out.
	let probe = Tracked::new(30, &drops);
	let removed = tree.remove(&probe).unwrap();
	drop(probe);
	assert_eq!(removed.key, 30);
	assert_eq!(drops.load(Ordering::SeqCst), 1, "only the probe should be dropped so far");

	drop(removed);
	assert_eq!(drops.load(Ordering::SeqCst), 2);
	assert_eq!(tree.len(), 6);
	tree.assert_invariants();
}

#[test]
fn insert_remove_all_frees_everything() {
	let drops = Arc::new(AtomicUsize::new(0));
	let mut tree = Tree::new();
	for key in 0..1_000 {
		tree.insert(Tracked::new(key, &drops));
	}
	for key in 0..1_000 {
		let probe = Tracked::new(key, &drops);
		assert!(tree.remove(&probe).is_some());
	}

	// Every stored value plus every probe.
	assert_eq!(drops.load(Ordering::SeqCst), 2_000);
	assert!(tree.is_empty());
}

// ===========================================================================
// Concurrent Memory Tests
// ===========================================================================

#[test]
fn shared_tree_frees_on_drop() {
	let drops = Arc::new(AtomicUsize::new(0));
	let tree = Arc::new(SharedTree::new());

	let handles: Vec<_> = (0..4u32)
		.map(|t| {
			let tree = Arc::clone(&tree);
			let drops = Arc::clone(&drops);
			thread::spawn(move || {
				for i in 0..250 {
					tree.insert(Tracked::new(t * 250 + i, &drops));
				}
			})
		})
		.collect();

	for h in handles {
		h.join().unwrap();
	}

	assert_eq!(tree.len(), 1_000);
	drop(tree);
	assert_eq!(drops.load(Ordering::SeqCst), 1_000);
}
