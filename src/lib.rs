//! # Avlpool: An AVL Tree Driven by a Worker Pool
//!
//! This crate provides a height-balanced binary search tree (an AVL tree) and
//! a fork-join worker layer that populates and depletes it concurrently, with
//! a **single lock** serializing every tree operation.
//!
//! ## Design Overview
//!
//! ### Balanced Tree Engine
//!
//! The [`node`] module holds the classic AVL algorithms as free functions over
//! a *slot*, the `Option<Box<Node<K>>>` that owns a subtree. Insertion and
//! removal recurse down to the target, then on the way back up recompute each
//! node's cached height and call [`node::rebalance`], which applies a single
//! or double rotation when sibling heights differ by more than one. Every node
//! is owned by exactly one parent, so removing a node frees exactly that node.
//!
//! [`Tree`] wraps the root slot with an element count, min/max,
//! successor/predecessor queries and in-order, pre-order and post-order
//! traversal. The engine never synchronizes.
//!
//! ### Single-Lock Coordination
//!
//! [`SharedTree`] puts one [`Tree`] behind one mutex. Each of its methods is a
//! single critical section: lock, one engine call, unlock. Workers can only
//! ever see the tree between operations, when both invariants hold.
//!
//! ```text
//!                    ┌─────────────────┐
//!                    │   SharedTree    │  <- one Mutex for the whole tree
//!                    │  Mutex<Tree<K>> │
//!                    └────────┬────────┘
//!                             │
//!                             ▼
//!                    ┌─────────────────┐
//!                    │      Node       │  value, height
//!                    │  left ── right  │  Option<Box<Node>>
//!                    └────────┬────────┘
//!                             │
//!                  ┌──────────┴──────────┐
//!                  ▼                     ▼
//!           ┌──────────┐          ┌──────────┐
//!           │   Node   │          │   Node   │
//!           └──────────┘          └──────────┘
//! ```
//!
//! The [`batch`] module partitions an index range into chunks, runs one scoped
//! thread per chunk, and joins them all. [`Workload`] ties a [`Config`] to a
//! population batch and a depletion batch.
//!
//! ## Basic Usage
//!
//! ```
//! use avlpool::{Traversal, Tree};
//!
//! let mut tree = Tree::new();
//! for v in [30, 20, 10] {
//!     tree.insert(v);
//! }
//!
//! // A single rotation lifted 20 to the root.
//! assert_eq!(tree.root().map(|n| *n.value()), Some(20));
//! assert_eq!(tree.to_vec(Traversal::InOrder), vec![10, 20, 30]);
//!
//! assert_eq!(tree.remove(&20), Some(20));
//! assert_eq!(tree.min(), Some(&10));
//! ```
//!
//! ## Thread Safety
//!
//! [`Tree`] is not synchronized; share it through [`SharedTree`], which is
//! `Sync` for `K: Send`. All access, reads included, is serialized by the one
//! lock. There is no cancellation: a batch runs every index of every chunk.

pub mod batch;
pub mod config;
pub mod error;
pub mod node;
pub mod shared;
pub mod tree;

mod sync;

pub use batch::{BatchKind, BatchReport, Chunk, Remainder, ValueStrategy, WorkerReport, Workload};
pub use config::Config;
pub use error::{Error, Result};
pub use shared::SharedTree;
pub use tree::{Traversal, Tree};
