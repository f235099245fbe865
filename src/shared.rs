//! The one tree and the one lock that every worker shares.
//!
//! Each method on [`SharedTree`] is a single critical section: acquire the
//! lock, make exactly one engine call, release. The engine never observes a
//! concurrent call, so the ordering and balance invariants hold whenever the
//! lock is free. Reads go through the same lock; there is no reader/writer
//! split.
//!
//! ```text
//!   worker 0 ──┐
//!   worker 1 ──┼──► Mutex<Tree<K>> ──► node::insert / node::remove
//!   worker 2 ──┘       (one lock)
//! ```

use std::borrow::Borrow;
use std::fmt;

use crate::sync::{AtomicUsize, Mutex, MutexGuard, Ordering};
use crate::tree::{Traversal, Tree};

/// A [`Tree`] behind a single mutual-exclusion lock.
pub struct SharedTree<K> {
	tree: Mutex<Tree<K>>,
	/// Number of critical sections entered so far.
	acquisitions: AtomicUsize,
}

impl<K> Default for SharedTree<K> {
	fn default() -> Self {
		Self::new()
	}
}

impl<K> From<Tree<K>> for SharedTree<K> {
	fn from(tree: Tree<K>) -> Self {
		SharedTree {
			tree: Mutex::new(tree),
			acquisitions: AtomicUsize::new(0),
		}
	}
}

impl<K: fmt::Debug> fmt::Debug for SharedTree<K> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SharedTree").field("tree", &*self.lock()).finish()
	}
}

impl<K> SharedTree<K> {
	/// Creates an empty shared tree.
	pub fn new() -> Self {
		Tree::new().into()
	}

	#[inline]
	fn lock(&self) -> MutexGuard<'_, Tree<K>> {
		let guard = self.tree.lock();
		self.acquisitions.fetch_add(1, Ordering::Relaxed);
		guard
	}

	/// Runs `f` with exclusive access to the tree, as one critical section.
	///
	/// Callers that need several engine calls to appear atomic can use this,
	/// at the cost of holding the lock for all of them.
	pub fn with<R, F>(&self, f: F) -> R
	where
		F: FnOnce(&mut Tree<K>) -> R,
	{
		f(&mut *self.lock())
	}

	/// Returns the number of critical sections entered so far.
	pub fn acquisitions(&self) -> usize {
		self.acquisitions.load(Ordering::Relaxed)
	}

	/// Returns the number of values stored.
	pub fn len(&self) -> usize {
		self.lock().len()
	}

	/// Returns `true` if the tree holds no values.
	pub fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}

	/// Consumes the lock, returning the tree.
	pub fn into_inner(self) -> Tree<K> {
		self.tree.into_inner()
	}
}

impl<K: Ord> SharedTree<K> {
	/// Inserts a value under the lock, returning `false` for a duplicate.
	pub fn insert(&self, value: K) -> bool {
		self.lock().insert(value)
	}

	/// Removes a value under the lock, returning it if it was present.
	pub fn remove<Q>(&self, value: &Q) -> Option<K>
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		self.lock().remove(value)
	}

	/// Returns `true` if a value equal to `value` is present.
	pub fn contains<Q>(&self, value: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		self.lock().contains(value)
	}
}

impl<K: Ord + Clone> SharedTree<K> {
	/// Returns a copy of the smallest value.
	pub fn min(&self) -> Option<K> {
		self.lock().min().cloned()
	}

	/// Returns a copy of the largest value.
	pub fn max(&self) -> Option<K> {
		self.lock().max().cloned()
	}

	/// Returns copies of the successor and predecessor of `value`.
	pub fn successor_and_predecessor<Q>(&self, value: &Q) -> (Option<K>, Option<K>)
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		let tree = self.lock();
		let (successor, predecessor) = tree.successor_and_predecessor(value);
		(successor.cloned(), predecessor.cloned())
	}

	/// Collects every value in the given order.
	pub fn to_vec(&self, order: Traversal) -> Vec<K> {
		self.lock().to_vec(order)
	}
}
