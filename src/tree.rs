//! The owning tree handle.
//!
//! [`Tree`] owns the root slot and counts its elements. It is a plain
//! single-threaded structure: `insert` and `remove` take `&mut self`, and the
//! only way to share one between threads is through
//! [`SharedTree`](crate::shared::SharedTree).

use std::borrow::Borrow;
use std::fmt;

use crate::node::{self, Link, Node};

/// The order in which [`Tree::traverse`] visits values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
	/// Left subtree, node, right subtree. Yields values in ascending order.
	InOrder,
	/// Node, left subtree, right subtree.
	PreOrder,
	/// Left subtree, right subtree, node.
	PostOrder,
}

/// An AVL tree of distinct, totally ordered values.
pub struct Tree<K> {
	root: Link<K>,
	len: usize,
}

impl<K> Default for Tree<K> {
	fn default() -> Self {
		Self::new()
	}
}

impl<K: fmt::Debug> fmt::Debug for Tree<K> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut set = f.debug_set();
		self.traverse(Traversal::InOrder, |value| {
			set.entry(value);
		});
		set.finish()
	}
}

impl<K> Tree<K> {
	/// Creates an empty tree. Does not allocate.
	///
	/// # Example
	///
	/// ```
	/// use avlpool::Tree;
	///
	/// let tree: Tree<i32> = Tree::new();
	/// assert!(tree.is_empty());
	/// assert_eq!(tree.height(), -1);
	/// ```
	pub const fn new() -> Self {
		Tree {
			root: None,
			len: 0,
		}
	}

	/// Returns the number of values stored.
	pub fn len(&self) -> usize {
		self.len
	}

	/// Returns `true` if the tree holds no values.
	pub fn is_empty(&self) -> bool {
		self.root.is_none()
	}

	/// Returns the height of the root, or -1 for an empty tree.
	pub fn height(&self) -> i32 {
		node::height(&self.root)
	}

	/// Returns the root node, for inspecting the tree's shape.
	pub fn root(&self) -> Option<&Node<K>> {
		self.root.as_deref()
	}

	/// Returns the smallest value.
	pub fn min(&self) -> Option<&K> {
		node::find_min(&self.root).map(Node::value)
	}

	/// Returns the largest value.
	pub fn max(&self) -> Option<&K> {
		node::find_max(&self.root).map(Node::value)
	}

	/// Drops every node.
	pub fn clear(&mut self) {
		self.root = None;
		self.len = 0;
	}

	/// Visits every value in the given order.
	///
	/// # Example
	///
	/// ```
	/// use avlpool::{Traversal, Tree};
	///
	/// let mut tree = Tree::new();
	/// for v in [2, 1, 3] {
	///     tree.insert(v);
	/// }
	///
	/// let mut seen = Vec::new();
	/// tree.traverse(Traversal::PreOrder, |v| seen.push(*v));
	/// assert_eq!(seen, vec![2, 1, 3]);
	/// ```
	pub fn traverse<F>(&self, order: Traversal, mut f: F)
	where
		F: FnMut(&K),
	{
		visit(&self.root, order, &mut f);
	}

	/// Collects every value in the given order.
	pub fn to_vec(&self, order: Traversal) -> Vec<K>
	where
		K: Clone,
	{
		let mut out = Vec::with_capacity(self.len);
		self.traverse(order, |value| out.push(value.clone()));
		out
	}
}

impl<K: Ord> Tree<K> {
	/// Inserts a value, returning `false` if an equal value was already present.
	///
	/// # Example
	///
	/// ```
	/// use avlpool::Tree;
	///
	/// let mut tree = Tree::new();
	/// assert!(tree.insert(7));
	/// assert!(!tree.insert(7));
	/// assert_eq!(tree.len(), 1);
	/// ```
	pub fn insert(&mut self, value: K) -> bool {
		let inserted = node::insert(&mut self.root, value);
		if inserted {
			self.len += 1;
		}
		inserted
	}

	/// Removes a value, returning it if it was present.
	///
	/// # Example
	///
	/// ```
	/// use avlpool::Tree;
	///
	/// let mut tree = Tree::new();
	/// tree.insert(1);
	///
	/// assert_eq!(tree.remove(&1), Some(1));
	/// assert_eq!(tree.remove(&1), None);
	/// ```
	pub fn remove<Q>(&mut self, value: &Q) -> Option<K>
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		let removed = node::remove(&mut self.root, value);
		if removed.is_some() {
			self.len -= 1;
		}
		removed
	}

	/// Returns `true` if a value equal to `value` is present.
	pub fn contains<Q>(&self, value: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		node::find(&self.root, value).is_some()
	}

	/// Returns the next larger and next smaller stored values relative to
	/// `value`, which need not be present itself.
	///
	/// # Example
	///
	/// ```
	/// use avlpool::Tree;
	///
	/// let mut tree = Tree::new();
	/// for v in [1, 2, 3] {
	///     tree.insert(v);
	/// }
	///
	/// assert_eq!(tree.successor_and_predecessor(&2), (Some(&3), Some(&1)));
	/// assert_eq!(tree.successor_and_predecessor(&0), (Some(&1), None));
	/// assert_eq!(tree.successor_and_predecessor(&4), (None, Some(&3)));
	/// ```
	pub fn successor_and_predecessor<Q>(&self, value: &Q) -> (Option<&K>, Option<&K>)
	where
		K: Borrow<Q>,
		Q: ?Sized + Ord,
	{
		let (successor, predecessor) = node::successor_and_predecessor(&self.root, value);
		(successor.map(Node::value), predecessor.map(Node::value))
	}
}

impl<K: Ord> Extend<K> for Tree<K> {
	fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
		for value in iter {
			self.insert(value);
		}
	}
}

impl<K: Ord> FromIterator<K> for Tree<K> {
	fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
		let mut tree = Tree::new();
		tree.extend(iter);
		tree
	}
}

fn visit<K, F>(link: &Link<K>, order: Traversal, f: &mut F)
where
	F: FnMut(&K),
{
	let Some(node) = link else {
		return;
	};
	match order {
		Traversal::InOrder => {
			visit(&node.left, order, f);
			f(&node.value);
			visit(&node.right, order, f);
		}
		Traversal::PreOrder => {
			f(&node.value);
			visit(&node.left, order, f);
			visit(&node.right, order, f);
		}
		Traversal::PostOrder => {
			visit(&node.left, order, f);
			visit(&node.right, order, f);
			f(&node.value);
		}
	}
}

// ===========================================================================
// Test-Only Validation
// ===========================================================================

/// Invariant validation for testing.
#[cfg(any(test, feature = "test-utils"))]
impl<K: Ord + fmt::Debug> Tree<K> {
	/// Validates all tree invariants. Panics with diagnostic info if any invariant is violated.
	///
	/// # Invariants Checked
	///
	/// 1. Ordering: every value in a left subtree is smaller, every value in a
	///    right subtree is larger, than the node's value
	/// 2. Height consistency: each cached height is one more than the taller child
	/// 3. Balance: sibling subtree heights differ by at most one
	/// 4. Length consistency: `len` matches the number of nodes
	pub fn assert_invariants(&self) {
		let count = validate_node_recursive(&self.root, None, None);

		// Invariant 4: Length consistency
		assert_eq!(count, self.len, "len field is {} but the tree holds {} nodes", self.len, count);
	}
}

/// Recursively validates a subtree, returning its node count.
///
/// # Arguments
/// * `link` - The subtree to validate
/// * `lower` - Exclusive lower bound from ancestors, None if leftmost
/// * `upper` - Exclusive upper bound from ancestors, None if rightmost
#[cfg(any(test, feature = "test-utils"))]
fn validate_node_recursive<K: Ord + fmt::Debug>(
	link: &Link<K>,
	lower: Option<&K>,
	upper: Option<&K>,
) -> usize {
	let Some(node) = link else {
		return 0;
	};

	// Invariant 1: Ordering
	if let Some(lower) = lower {
		assert!(node.value > *lower, "value {:?} is not greater than ancestor bound {:?}", node.value, lower);
	}
	if let Some(upper) = upper {
		assert!(node.value < *upper, "value {:?} is not less than ancestor bound {:?}", node.value, upper);
	}

	let left = validate_node_recursive(&node.left, lower, Some(&node.value));
	let right = validate_node_recursive(&node.right, Some(&node.value), upper);

	let left_height = node::height(&node.left);
	let right_height = node::height(&node.right);

	// Invariant 2: Height consistency
	assert_eq!(
		node.height,
		1 + left_height.max(right_height),
		"stale height at {:?} (left {}, right {})",
		node.value,
		left_height,
		right_height
	);

	// Invariant 3: Balance
	assert!(
		(left_height - right_height).abs() <= 1,
		"unbalanced node {:?} (left {}, right {})",
		node.value,
		left_height,
		right_height
	);

	left + right + 1
}
