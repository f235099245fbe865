//! # Error Types for the Worker Pool
//!
//! The tree engine itself has no recoverable failures: a duplicate insert
//! returns `false`, a removal miss returns `None`, and a rotation toward an
//! absent child is a bug that panics. Errors only arise around the engine,
//! while configuring a workload or running the worker threads of a batch.
//!
//! ## Error Flow
//!
//! ```text
//! Config ──validate──► Err(NoWorkers | EmptyRemovalRange | TooManyElements)
//!    │
//!    ▼
//! partition_range ──► Err(NoWorkers)
//!    │
//!    ▼
//! spawn workers ────► Err(Spawn)          (already spawned workers are still joined)
//!    │
//!    ▼
//! join workers ─────► Err(WorkerPanicked)
//!    │
//!    ▼
//! BatchReport
//! ```

use thiserror::Error;

/// Errors that can occur while configuring or running a batch.
#[derive(Error, Debug)]
pub enum Error {
	/// A batch was requested with zero workers.
	#[error("worker count must be at least one")]
	NoWorkers,

	/// A depletion batch was requested with an upper bound of zero, which
	/// leaves no value to draw.
	#[error("removal upper bound must be at least one")]
	EmptyRemovalRange,

	/// The index range is too large for every index to own a band of values.
	#[error("element count {elements} exceeds the maximum of {max}")]
	TooManyElements {
		/// The configured element count.
		elements: u64,
		/// The largest element count whose values fit in a `u64`.
		max: u64,
	},

	/// The operating system refused to start a worker thread.
	#[error("failed to spawn worker {worker}")]
	Spawn {
		/// Index of the chunk whose worker could not be started.
		worker: usize,
		#[source]
		source: std::io::Error,
	},

	/// A worker thread panicked before finishing its chunk.
	///
	/// The lock is released by unwinding, and the tree invariants hold between
	/// engine calls, so the tree itself stays usable.
	#[error("worker {worker} panicked")]
	WorkerPanicked {
		/// Index of the chunk whose worker panicked.
		worker: usize,
	},

	/// A configuration document could not be parsed.
	#[error("invalid configuration")]
	Config(#[from] serde_json::Error),

	/// A configuration file could not be read.
	#[error("failed to read configuration")]
	Io(#[from] std::io::Error),
}

/// A Result type alias using our custom Error type.
pub type Result<T> = std::result::Result<T, Error>;
