//! The AVL node and the slot-based algorithms that keep it balanced.
//!
//! Every mutating function takes the *slot* that owns a subtree, either a
//! `&mut Link<K>` or, when the subtree root is known to exist, a
//! `&mut Box<Node<K>>`. A function that restructures the subtree rewrites the
//! slot in place, so the caller's child link always points at the current
//! subtree root.
//!
//! ```text
//!   rotate_with_left_child           rotate_with_right_child
//!
//!         k2              k1             k1                  k2
//!        /  \            /  \           /  \                /  \
//!      k1    Z   ==>    X    k2        X    k2     ==>    k1    Z
//!     /  \                  /  \           /  \          /  \
//!    X    Y                Y    Z         Y    Z        X    Y
//! ```
//!
//! None of these functions synchronize. Callers sharing a tree between
//! threads must serialize every call, see [`crate::shared::SharedTree`].

use std::borrow::Borrow;
use std::cmp::{self, Ordering};
use std::mem;

/// An owned, possibly absent subtree.
pub type Link<K> = Option<Box<Node<K>>>;

/// One stored value and the two subtrees hanging off it.
#[derive(Debug)]
pub struct Node<K> {
	pub(crate) value: K,
	pub(crate) left: Link<K>,
	pub(crate) right: Link<K>,
	/// Cached height of this subtree. A leaf has height 0.
	pub(crate) height: i32,
}

impl<K> Node<K> {
	/// Creates a leaf holding `value`.
	pub fn leaf(value: K) -> Self {
		Node {
			value,
			left: None,
			right: None,
			height: 0,
		}
	}

	/// The stored value.
	pub fn value(&self) -> &K {
		&self.value
	}

	/// The left subtree, holding strictly smaller values.
	pub fn left(&self) -> Option<&Node<K>> {
		self.left.as_deref()
	}

	/// The right subtree, holding strictly larger values.
	pub fn right(&self) -> Option<&Node<K>> {
		self.right.as_deref()
	}

	/// The cached height of this subtree.
	pub fn height(&self) -> i32 {
		self.height
	}

	#[inline]
	fn update_height(&mut self) {
		self.height = 1 + cmp::max(height(&self.left), height(&self.right));
	}

	#[inline]
	fn balance_factor(&self) -> i32 {
		height(&self.left) - height(&self.right)
	}
}

/// The restructuring applied by [`rebalance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
	/// Single rotation lifting the left child (left-left case).
	WithLeftChild,
	/// Single rotation lifting the right child (right-right case).
	WithRightChild,
	/// Left child rotated outward first, then lifted (left-right case).
	DoubleWithLeftChild,
	/// Right child rotated outward first, then lifted (right-left case).
	DoubleWithRightChild,
}

/// Returns the cached height of a subtree, or -1 if it is absent.
#[inline]
pub fn height<K>(link: &Link<K>) -> i32 {
	link.as_ref().map_or(-1, |node| node.height)
}

/// Lifts the left child of `k2` into its place.
///
/// # Panics
///
/// Panics if `k2` has no left child. Rebalancing only rotates toward the
/// taller side, so this indicates a bug in the caller.
pub fn rotate_with_left_child<K>(k2: &mut Box<Node<K>>) {
	let Some(mut k1) = k2.left.take() else {
		panic!("rotate_with_left_child: node has no left child");
	};
	k2.left = k1.right.take();
	k2.update_height();
	// After the swap the slot holds the old left child and `k1` the old root.
	mem::swap(k2, &mut k1);
	k2.right = Some(k1);
	k2.update_height();
}

/// Lifts the right child of `k2` into its place.
///
/// # Panics
///
/// Panics if `k2` has no right child.
pub fn rotate_with_right_child<K>(k2: &mut Box<Node<K>>) {
	let Some(mut k1) = k2.right.take() else {
		panic!("rotate_with_right_child: node has no right child");
	};
	k2.right = k1.left.take();
	k2.update_height();
	mem::swap(k2, &mut k1);
	k2.left = Some(k1);
	k2.update_height();
}

/// Double rotation for a left child that is heavy on its inner (right) side.
///
/// # Panics
///
/// Panics if `k3` has no left child or that child has no right child.
pub fn double_with_left_child<K>(k3: &mut Box<Node<K>>) {
	match k3.left.as_mut() {
		Some(k1) => rotate_with_right_child(k1),
		None => panic!("double_with_left_child: node has no left child"),
	}
	rotate_with_left_child(k3);
}

/// Double rotation for a right child that is heavy on its inner (left) side.
///
/// # Panics
///
/// Panics if `k3` has no right child or that child has no left child.
pub fn double_with_right_child<K>(k3: &mut Box<Node<K>>) {
	match k3.right.as_mut() {
		Some(k1) => rotate_with_left_child(k1),
		None => panic!("double_with_right_child: node has no right child"),
	}
	rotate_with_right_child(k3);
}

/// Restores the balance of the subtree in `slot` if its children differ in
/// height by more than one.
///
/// A single rotation is used when the taller child's outer grandchild is at
/// least as tall as its inner one, otherwise a double rotation. Both children
/// must already be balanced and the root's cached height must be current.
///
/// Returns the rotation performed, or `None` if the subtree was already
/// balanced or absent.
pub fn rebalance<K>(slot: &mut Link<K>) -> Option<Rotation> {
	let node = slot.as_mut()?;
	let balance = node.balance_factor();

	let rotation = if balance > 1 {
		let outer = node.left.as_ref().is_some_and(|l| height(&l.left) >= height(&l.right));
		if outer {
			rotate_with_left_child(node);
			Rotation::WithLeftChild
		} else {
			double_with_left_child(node);
			Rotation::DoubleWithLeftChild
		}
	} else if balance < -1 {
		let outer = node.right.as_ref().is_some_and(|r| height(&r.right) >= height(&r.left));
		if outer {
			rotate_with_right_child(node);
			Rotation::WithRightChild
		} else {
			double_with_right_child(node);
			Rotation::DoubleWithRightChild
		}
	} else {
		return None;
	};

	tracing::trace!(?rotation, "rebalanced subtree");
	Some(rotation)
}

/// Inserts `value` into the subtree in `slot`.
///
/// Returns `false` and leaves the tree untouched if an equal value is already
/// present.
pub fn insert<K: Ord>(slot: &mut Link<K>, value: K) -> bool {
	let node = match slot {
		Some(node) => node,
		None => {
			*slot = Some(Box::new(Node::leaf(value)));
			return true;
		}
	};

	let inserted = match value.cmp(&node.value) {
		Ordering::Less => insert(&mut node.left, value),
		Ordering::Greater => insert(&mut node.right, value),
		Ordering::Equal => return false,
	};

	if inserted {
		node.update_height();
		rebalance(slot);
	}
	inserted
}

/// Removes `value` from the subtree in `slot`, returning the value that was
/// stored.
///
/// A node with two children keeps its position: the minimum of its right
/// subtree is detached and moved into it, and the node's original value is
/// returned. Returns `None` if no equal value is present.
pub fn remove<K, Q>(slot: &mut Link<K>, value: &Q) -> Option<K>
where
	K: Borrow<Q> + Ord,
	Q: ?Sized + Ord,
{
	let node = slot.as_mut()?;

	let removed = match value.cmp(node.value.borrow()) {
		Ordering::Less => remove(&mut node.left, value),
		Ordering::Greater => remove(&mut node.right, value),
		Ordering::Equal if node.left.is_some() && node.right.is_some() => {
			let successor = detach_min(&mut node.right)?;
			Some(mem::replace(&mut node.value, successor))
		}
		Ordering::Equal => {
			let mut detached = slot.take()?;
			// The surviving child is already a balanced subtree.
			*slot = detached.left.take().or_else(|| detached.right.take());
			return Some(detached.value);
		}
	};

	if removed.is_some() {
		if let Some(node) = slot.as_mut() {
			node.update_height();
		}
		rebalance(slot);
	}
	removed
}

/// Detaches the leftmost node of the subtree in `slot` and returns its value,
/// rebalancing every node on the path.
fn detach_min<K>(slot: &mut Link<K>) -> Option<K> {
	let node = slot.as_mut()?;

	if node.left.is_some() {
		let min = detach_min(&mut node.left);
		node.update_height();
		rebalance(slot);
		min
	} else {
		let mut detached = slot.take()?;
		*slot = detached.right.take();
		Some(detached.value)
	}
}

/// Returns the node holding a value equal to `value`.
pub fn find<'a, K, Q>(link: &'a Link<K>, value: &Q) -> Option<&'a Node<K>>
where
	K: Borrow<Q>,
	Q: ?Sized + Ord,
{
	let mut current = link.as_deref();
	while let Some(node) = current {
		current = match value.cmp(node.value.borrow()) {
			Ordering::Less => node.left.as_deref(),
			Ordering::Greater => node.right.as_deref(),
			Ordering::Equal => return Some(node),
		};
	}
	None
}

/// Returns the leftmost node of the subtree, holding its smallest value.
pub fn find_min<K>(link: &Link<K>) -> Option<&Node<K>> {
	let mut node = link.as_deref()?;
	while let Some(left) = node.left.as_deref() {
		node = left;
	}
	Some(node)
}

/// Returns the rightmost node of the subtree, holding its largest value.
pub fn find_max<K>(link: &Link<K>) -> Option<&Node<K>> {
	let mut node = link.as_deref()?;
	while let Some(right) = node.right.as_deref() {
		node = right;
	}
	Some(node)
}

/// Finds the nodes holding the next larger and next smaller value relative to
/// `value`, which does not have to be present.
///
/// Returns `(successor, predecessor)`.
pub fn successor_and_predecessor<'a, K, Q>(
	link: &'a Link<K>,
	value: &Q,
) -> (Option<&'a Node<K>>, Option<&'a Node<K>>)
where
	K: Borrow<Q>,
	Q: ?Sized + Ord,
{
	let mut successor = None;
	let mut predecessor = None;
	let mut current = link.as_deref();

	while let Some(node) = current {
		match value.cmp(node.value.borrow()) {
			Ordering::Less => {
				successor = Some(node);
				current = node.left.as_deref();
			}
			Ordering::Greater => {
				predecessor = Some(node);
				current = node.right.as_deref();
			}
			Ordering::Equal => {
				if let Some(min) = find_min(&node.right) {
					successor = Some(min);
				}
				if let Some(max) = find_max(&node.left) {
					predecessor = Some(max);
				}
				break;
			}
		}
	}

	(successor, predecessor)
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Builds a node with correctly cached height from already built children.
	fn node(value: i32, left: Link<i32>, right: Link<i32>) -> Link<i32> {
		let mut n = Box::new(Node {
			value,
			left,
			right,
			height: 0,
		});
		n.update_height();
		Some(n)
	}

	fn leaf(value: i32) -> Link<i32> {
		node(value, None, None)
	}

	fn values(link: &Link<i32>) -> Vec<i32> {
		fn walk(link: &Link<i32>, out: &mut Vec<i32>) {
			if let Some(n) = link {
				walk(&n.left, out);
				out.push(n.value);
				walk(&n.right, out);
			}
		}
		let mut out = Vec::new();
		walk(link, &mut out);
		out
	}

	#[test]
	fn height_of_absent_and_leaf() {
		assert_eq!(height::<i32>(&None), -1);
		assert_eq!(height(&leaf(1)), 0);
		assert_eq!(height(&node(2, leaf(1), None)), 1);
	}

	#[test]
	fn single_rotation_with_left_child() {
		let mut slot = node(30, node(20, leaf(10), None), None);
		assert_eq!(rebalance(&mut slot), Some(Rotation::WithLeftChild));

		let root = slot.as_deref().unwrap();
		assert_eq!(root.value, 20);
		assert_eq!(root.height, 1);
		assert_eq!(root.left().unwrap().value, 10);
		assert_eq!(root.right().unwrap().value, 30);
		assert_eq!(root.right().unwrap().height, 0);
	}

	#[test]
	fn single_rotation_with_right_child() {
		let mut slot = node(10, None, node(20, None, leaf(30)));
		assert_eq!(rebalance(&mut slot), Some(Rotation::WithRightChild));

		let root = slot.as_deref().unwrap();
		assert_eq!(root.value, 20);
		assert_eq!(root.left().unwrap().value, 10);
		assert_eq!(root.right().unwrap().value, 30);
	}

	#[test]
	fn double_rotation_for_zig_zag() {
		let mut slot = node(30, node(10, None, leaf(20)), None);
		assert_eq!(rebalance(&mut slot), Some(Rotation::DoubleWithLeftChild));
		assert_eq!(slot.as_ref().unwrap().value, 20);
		assert_eq!(values(&slot), vec![10, 20, 30]);

		let mut slot = node(10, None, node(30, leaf(20), None));
		assert_eq!(rebalance(&mut slot), Some(Rotation::DoubleWithRightChild));
		assert_eq!(slot.as_ref().unwrap().value, 20);
		assert_eq!(slot.as_ref().unwrap().height, 1);
	}

	#[test]
	fn tie_prefers_single_rotation() {
		// Equally tall grandchildren only occur after a removal on the other side.
		let mut slot = node(50, node(30, leaf(20), leaf(40)), None);

		assert_eq!(rebalance(&mut slot), Some(Rotation::WithLeftChild));
		let root = slot.as_deref().unwrap();
		assert_eq!(root.value, 30);
		assert_eq!(root.height, 2);
		assert_eq!(root.right().unwrap().value, 50);
		assert_eq!(root.right().unwrap().left().unwrap().value, 40);
		assert_eq!(values(&slot), vec![20, 30, 40, 50]);
	}

	#[test]
	fn rebalance_balanced_or_empty_is_noop() {
		let mut empty: Link<i32> = None;
		assert_eq!(rebalance(&mut empty), None);

		let mut slot = node(2, leaf(1), leaf(3));
		assert_eq!(rebalance(&mut slot), None);
		assert_eq!(slot.as_ref().unwrap().value, 2);
	}

	#[test]
	#[should_panic(expected = "no left child")]
	fn rotation_toward_absent_child_panics() {
		let mut slot = node(1, None, leaf(2));
		rotate_with_left_child(slot.as_mut().unwrap());
	}

	#[test]
	fn insert_rejects_duplicates() {
		let mut root = None;
		assert!(insert(&mut root, 5));
		assert!(insert(&mut root, 3));
		assert!(!insert(&mut root, 5));
		assert_eq!(values(&root), vec![3, 5]);
	}

	#[test]
	fn remove_two_children_returns_matched_value() {
		let mut root = None;
		for v in [20, 10, 30, 25, 35] {
			insert(&mut root, v);
		}

		assert_eq!(remove(&mut root, &20), Some(20));
		// The successor took the matched node's place.
		assert_eq!(root.as_ref().unwrap().value, 25);
		assert_eq!(values(&root), vec![10, 25, 30, 35]);
	}

	#[test]
	fn remove_missing_leaves_tree_untouched() {
		let mut root = None;
		for v in [2, 1, 3] {
			insert(&mut root, v);
		}
		assert_eq!(remove(&mut root, &4), None);
		assert_eq!(values(&root), vec![1, 2, 3]);

		let mut empty: Link<i32> = None;
		assert_eq!(remove(&mut empty, &1), None);
	}

	#[test]
	fn min_max_and_neighbours() {
		let mut root = None;
		assert!(find_min(&root).is_none());
		assert!(find_max(&root).is_none());

		for v in [1, 2, 3] {
			insert(&mut root, v);
		}
		assert_eq!(find_min(&root).map(Node::value), Some(&1));
		assert_eq!(find_max(&root).map(Node::value), Some(&3));
		assert_eq!(find(&root, &2).map(Node::value), Some(&2));
		assert!(find(&root, &7).is_none());

		let (succ, pred) = successor_and_predecessor(&root, &2);
		assert_eq!(succ.map(Node::value), Some(&3));
		assert_eq!(pred.map(Node::value), Some(&1));
	}
}
