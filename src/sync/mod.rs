//! Synchronization primitives with loom support.
//!
//! Under normal compilation, re-exports from std/parking_lot.
//! Under `cfg(loom)`, uses loom's equivalents for deterministic testing.
//!
//! # Usage
//!
//! Instead of importing directly from `std::sync::atomic` or `parking_lot`,
//! import from this module:
//!
//! ```ignore
//! use crate::sync::{AtomicUsize, Mutex, Ordering};
//! ```
//!
//! # Loom Integration
//!
//! When compiled with `--cfg loom`, the single tree lock becomes a loom mutex,
//! so loom can explore every order in which workers acquire it.

// Allow unused items - some are only used under loom cfg
#![allow(unused)]

// ===========================================================================
// Atomic Primitives
// ===========================================================================

#[cfg(not(loom))]
pub use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(loom)]
pub use loom::sync::atomic::{AtomicUsize, Ordering};

// ===========================================================================
// Mutex
// ===========================================================================

// parking_lot::Mutex hands out guards directly, while loom's Mutex wraps them
// in a LockResult. The loom side is wrapped to match parking_lot.

#[cfg(not(loom))]
pub use parking_lot::{Mutex, MutexGuard};

#[cfg(loom)]
mod loom_mutex {
	//! Wrapper types for loom's Mutex to match parking_lot's API.

	use loom::sync::{Mutex as LoomMutex, MutexGuard as LoomGuard};

	/// A wrapper around loom's Mutex that provides a parking_lot-compatible API.
	pub struct Mutex<T>(LoomMutex<T>);

	impl<T> Mutex<T> {
		/// Creates a new Mutex.
		pub fn new(value: T) -> Self {
			Mutex(LoomMutex::new(value))
		}

		/// Acquires the lock, blocking until available.
		pub fn lock(&self) -> MutexGuard<'_, T> {
			MutexGuard(self.0.lock().unwrap())
		}

		/// Consumes the mutex, returning the protected value.
		pub fn into_inner(self) -> T {
			self.0.into_inner().unwrap()
		}
	}

	/// Wrapper around loom's mutex guard.
	pub struct MutexGuard<'a, T>(LoomGuard<'a, T>);

	impl<'a, T> std::ops::Deref for MutexGuard<'a, T> {
		type Target = T;
		fn deref(&self) -> &T {
			&self.0
		}
	}

	impl<'a, T> std::ops::DerefMut for MutexGuard<'a, T> {
		fn deref_mut(&mut self) -> &mut T {
			&mut self.0
		}
	}
}

#[cfg(loom)]
pub use loom_mutex::{Mutex, MutexGuard};
