//! Fork-join batches of workers driving a [`SharedTree`].
//!
//! A batch splits an index range into [`Chunk`]s, starts one scoped thread per
//! chunk, and joins them all before returning. For every index in its chunk a
//! worker derives a value, enters one critical section on the shared tree
//! (insert for population, remove for depletion), and moves on. Workers share
//! nothing but the tree; each owns its chunk and its random generator.
//!
//! ```text
//!             partition_range(12, 3)
//!      ┌──────────────┼──────────────┐
//!   [0, 3]         [4, 7]         [8, 11]
//!   worker 0       worker 1       worker 2
//!      │              │              │
//!      └──── lock ─ insert ─ unlock ─┘  (per index, any interleaving)
//!                     │
//!                   join
//! ```
//!
//! The order in which workers' operations reach the tree is whatever order
//! they win the lock in. The final contents depend only on the set of
//! operations when the values themselves do not depend on timing, as with
//! [`ValueStrategy::Sequential`] or a fixed seed.

use std::fmt;
use std::ops::RangeInclusive;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::shared::SharedTree;

/// Width of the value band each index owns under [`ValueStrategy::ChunkScaled`].
pub const VALUE_SCALE: u64 = 10;

// ---------------------------------------------------------------------------
// Partitioning
// ---------------------------------------------------------------------------

/// One worker's share of a batch: the inclusive index range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
	/// Index of the worker that processes this chunk.
	pub worker: usize,
	/// First index, inclusive.
	pub start: u64,
	/// Last index, inclusive.
	pub end: u64,
}

impl Chunk {
	/// Number of indices in the chunk. Zero if `end < start`, saturating at
	/// `u64::MAX` for the full range.
	pub fn size(&self) -> u64 {
		if self.end < self.start {
			return 0;
		}
		(self.end - self.start).saturating_add(1)
	}

	/// The indices this chunk's worker iterates over.
	pub fn indices(&self) -> RangeInclusive<u64> {
		self.start..=self.end
	}
}

/// What to do with the `total % workers` indices that do not divide evenly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Remainder {
	/// Leave them unassigned, so no worker ever processes them.
	#[default]
	Drop,
	/// Append them to the last chunk.
	LastChunk,
}

/// Splits `[0, total)` into `workers` contiguous chunks of `total / workers`
/// indices each.
///
/// Returns no chunks when `total < workers`, unless `remainder` is
/// [`Remainder::LastChunk`], in which case a single chunk covers everything.
///
/// # Example
///
/// ```
/// use avlpool::batch::{partition_range, Remainder};
///
/// let chunks = partition_range(12, 3, Remainder::Drop).unwrap();
/// let ranges: Vec<_> = chunks.iter().map(|c| (c.start, c.end)).collect();
/// assert_eq!(ranges, vec![(0, 3), (4, 7), (8, 11)]);
/// ```
pub fn partition_range(total: u64, workers: usize, remainder: Remainder) -> Result<Vec<Chunk>> {
	if workers == 0 {
		return Err(Error::NoWorkers);
	}

	let per_worker = total / workers as u64;
	if per_worker == 0 {
		return Ok(match remainder {
			Remainder::LastChunk if total > 0 => vec![Chunk {
				worker: 0,
				start: 0,
				end: total - 1,
			}],
			_ => Vec::new(),
		});
	}

	let mut chunks: Vec<Chunk> = (0..workers)
		.map(|worker| {
			let start = worker as u64 * per_worker;
			Chunk {
				worker,
				start,
				end: start + per_worker - 1,
			}
		})
		.collect();

	let dropped = total - per_worker * workers as u64;
	if dropped > 0 {
		match remainder {
			Remainder::Drop => {
				tracing::debug!(total, workers, dropped, "indices left unassigned by partitioning");
			}
			Remainder::LastChunk => {
				if let Some(last) = chunks.last_mut() {
					last.end = total - 1;
				}
			}
		}
	}

	Ok(chunks)
}

// ---------------------------------------------------------------------------
// Value Synthesis
// ---------------------------------------------------------------------------

/// How a worker turns an index into the value it inserts or removes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ValueStrategy {
	/// Population draws uniformly from the chunk's own band
	/// `[start * 10, (end + 1) * 10)`; depletion draws uniformly from
	/// `[0, removal_upper_bound)`.
	#[default]
	ChunkScaled,
	/// Population uses the index itself; depletion uses
	/// `index % removal_upper_bound`. No randomness.
	Sequential,
}

impl ValueStrategy {
	/// The value inserted for `index` of `chunk`.
	pub fn population_value<R: Rng>(&self, chunk: &Chunk, index: u64, rng: &mut R) -> u64 {
		match self {
			ValueStrategy::ChunkScaled => {
				let low = chunk.start.saturating_mul(VALUE_SCALE);
				let high = low.saturating_add(chunk.size().saturating_mul(VALUE_SCALE));
				// The band collapses once it saturates at u64::MAX.
				if low < high {
					rng.random_range(low..high)
				} else {
					low
				}
			}
			ValueStrategy::Sequential => index,
		}
	}

	/// The value removed for `index`. `upper_bound` must be non-zero.
	pub fn depletion_value<R: Rng>(&self, index: u64, upper_bound: u64, rng: &mut R) -> u64 {
		match self {
			ValueStrategy::ChunkScaled => rng.random_range(0..upper_bound),
			ValueStrategy::Sequential => index % upper_bound,
		}
	}
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Which engine operation a batch applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
	/// Every index inserts a value.
	Population,
	/// Every index attempts to remove a value.
	Depletion,
}

impl BatchKind {
	fn as_str(self) -> &'static str {
		match self {
			BatchKind::Population => "populate",
			BatchKind::Depletion => "deplete",
		}
	}

	/// Mixed into the seed so the two batches of one run draw different streams.
	fn salt(self) -> u64 {
		match self {
			BatchKind::Population => 0,
			BatchKind::Depletion => 0x9e37_79b9_7f4a_7c15,
		}
	}
}

impl fmt::Display for BatchKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// What one worker did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
	/// Index of the worker's chunk.
	pub worker: usize,
	/// Critical sections entered, one per index.
	pub attempted: u64,
	/// Operations that changed the tree: new insertions or successful removals.
	pub applied: u64,
}

impl WorkerReport {
	fn new(worker: usize) -> Self {
		WorkerReport {
			worker,
			attempted: 0,
			applied: 0,
		}
	}
}

/// What a whole batch did, once every worker has been joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
	/// The operation the batch applied.
	pub kind: BatchKind,
	/// One entry per chunk, in chunk order.
	pub workers: Vec<WorkerReport>,
	/// Wall-clock time from the first spawn to the last join.
	pub elapsed: Duration,
}

impl BatchReport {
	/// Total critical sections entered across workers.
	pub fn attempted(&self) -> u64 {
		self.workers.iter().map(|w| w.attempted).sum()
	}

	/// Total operations that changed the tree.
	pub fn applied(&self) -> u64 {
		self.workers.iter().map(|w| w.applied).sum()
	}
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

fn worker_rng(seed: Option<u64>, kind: BatchKind, worker: usize) -> StdRng {
	match seed {
		Some(seed) => StdRng::seed_from_u64((seed ^ kind.salt()).wrapping_add(worker as u64)),
		None => StdRng::from_os_rng(),
	}
}

fn worker_builder(kind: BatchKind, chunk: &Chunk) -> thread::Builder {
	thread::Builder::new().name(format!("avlpool-{}-{}", kind, chunk.worker))
}

/// Spawns one scoped worker per chunk and joins them all.
fn run_batch<F>(kind: BatchKind, chunks: &[Chunk], work: F) -> Result<BatchReport>
where
	F: Fn(&Chunk) -> WorkerReport + Sync,
{
	run_batch_with(kind, chunks, worker_builder, work)
}

fn run_batch_with<B, F>(kind: BatchKind, chunks: &[Chunk], builder: B, work: F) -> Result<BatchReport>
where
	B: Fn(BatchKind, &Chunk) -> thread::Builder,
	F: Fn(&Chunk) -> WorkerReport + Sync,
{
	let started = Instant::now();
	tracing::debug!(%kind, workers = chunks.len(), "starting batch");

	let workers = thread::scope(|scope| -> Result<Vec<WorkerReport>> {
		let work = &work;
		let mut handles = Vec::with_capacity(chunks.len());
		let mut spawn_error = None;
		for chunk in chunks {
			match builder(kind, chunk).spawn_scoped(scope, move || work(chunk)) {
				Ok(handle) => handles.push((chunk.worker, handle)),
				Err(source) => {
					spawn_error = Some(Error::Spawn {
						worker: chunk.worker,
						source,
					});
					break;
				}
			}
		}

		// Join every started worker before reporting. A handle left unjoined
		// would have its panic re-raised when the scope exits.
		let mut reports = Vec::with_capacity(handles.len());
		let mut panicked = None;
		for (worker, handle) in handles {
			match handle.join() {
				Ok(report) => reports.push(report),
				Err(_) => {
					panicked.get_or_insert(worker);
				}
			}
		}
		if let Some(err) = spawn_error {
			tracing::warn!(%kind, error = %err, "batch aborted");
			return Err(err);
		}
		match panicked {
			Some(worker) => Err(Error::WorkerPanicked {
				worker,
			}),
			None => Ok(reports),
		}
	})?;

	let report = BatchReport {
		kind,
		workers,
		elapsed: started.elapsed(),
	};
	tracing::debug!(
		%kind,
		attempted = report.attempted(),
		applied = report.applied(),
		elapsed = ?report.elapsed,
		"batch complete"
	);
	Ok(report)
}

/// Inserts one value per index of every chunk, one worker per chunk.
///
/// Blocks until every worker has finished. Duplicates are dropped by the tree
/// and show up as `attempted - applied` in the report.
pub fn run_population_batch(
	tree: &SharedTree<u64>,
	chunks: &[Chunk],
	strategy: ValueStrategy,
	seed: Option<u64>,
) -> Result<BatchReport> {
	run_batch(BatchKind::Population, chunks, |chunk| {
		let mut rng = worker_rng(seed, BatchKind::Population, chunk.worker);
		let mut report = WorkerReport::new(chunk.worker);
		for index in chunk.indices() {
			let value = strategy.population_value(chunk, index, &mut rng);
			report.attempted += 1;
			if tree.insert(value) {
				report.applied += 1;
			}
		}
		report
	})
}

/// Attempts one removal per index of every chunk, one worker per chunk.
///
/// Values are drawn from `[0, removal_upper_bound)`. Each value actually
/// removed is passed to `on_removed` after the lock has been released; values
/// not present are skipped silently. Blocks until every worker has finished.
pub fn run_depletion_batch<F>(
	tree: &SharedTree<u64>,
	chunks: &[Chunk],
	strategy: ValueStrategy,
	removal_upper_bound: u64,
	seed: Option<u64>,
	on_removed: F,
) -> Result<BatchReport>
where
	F: Fn(u64) + Sync,
{
	if removal_upper_bound == 0 {
		return Err(Error::EmptyRemovalRange);
	}

	run_batch(BatchKind::Depletion, chunks, |chunk| {
		let mut rng = worker_rng(seed, BatchKind::Depletion, chunk.worker);
		let mut report = WorkerReport::new(chunk.worker);
		for index in chunk.indices() {
			let value = strategy.depletion_value(index, removal_upper_bound, &mut rng);
			report.attempted += 1;
			let removed = tree.remove(&value);
			if let Some(removed) = removed {
				report.applied += 1;
				tracing::debug!(worker = chunk.worker, removed, "removed value");
				on_removed(removed);
			}
		}
		report
	})
}

// ---------------------------------------------------------------------------
// Drivers
// ---------------------------------------------------------------------------

/// A validated [`Config`] that runs population and depletion batches.
///
/// # Example
///
/// ```
/// use avlpool::{Config, SharedTree, ValueStrategy, Workload};
///
/// let workload = Workload::new(Config {
///     elements: 12,
///     workers: 3,
///     removal_upper_bound: 12,
///     strategy: ValueStrategy::Sequential,
///     ..Config::default()
/// })
/// .unwrap();
///
/// let tree = SharedTree::new();
/// workload.populate(&tree).unwrap();
/// assert_eq!(tree.len(), 12);
///
/// workload.deplete(&tree, |_| {}).unwrap();
/// assert!(tree.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Workload {
	config: Config,
}

impl Workload {
	/// Validates `config` and wraps it.
	pub fn new(config: Config) -> Result<Self> {
		config.validate()?;
		Ok(Workload {
			config,
		})
	}

	/// The configuration this workload runs.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Partitions the configured index range.
	pub fn chunks(&self) -> Result<Vec<Chunk>> {
		partition_range(self.config.elements, self.config.workers, self.config.remainder)
	}

	/// Runs the population batch.
	pub fn populate(&self, tree: &SharedTree<u64>) -> Result<BatchReport> {
		let chunks = self.chunks()?;
		run_population_batch(tree, &chunks, self.config.strategy, self.config.seed)
	}

	/// Runs the depletion batch, passing each removed value to `on_removed`.
	pub fn deplete<F>(&self, tree: &SharedTree<u64>, on_removed: F) -> Result<BatchReport>
	where
		F: Fn(u64) + Sync,
	{
		let chunks = self.chunks()?;
		run_depletion_batch(
			tree,
			&chunks,
			self.config.strategy,
			self.config.removal_upper_bound,
			self.config.seed,
			on_removed,
		)
	}
}
