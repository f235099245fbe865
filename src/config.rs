//! Workload configuration.
//!
//! A [`Config`] describes one population batch followed by one depletion
//! batch. Every field has a default, so a JSON document only needs to name
//! the fields it changes:
//!
//! ```json
//! { "elements": 100000, "workers": 4, "strategy": "sequential" }
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::batch::{Remainder, ValueStrategy, VALUE_SCALE};
use crate::error::{Error, Result};

/// Default number of indices partitioned across the workers.
pub const DEFAULT_ELEMENTS: u64 = 1_000;

/// Default number of worker threads per batch.
pub const DEFAULT_WORKERS: usize = 3;

/// Default exclusive upper bound of the values a depletion batch tries to remove.
pub const DEFAULT_REMOVAL_UPPER_BOUND: u64 = 5_000;

/// Largest element count for which every index's value band fits in a `u64`.
pub const MAX_ELEMENTS: u64 = u64::MAX / VALUE_SCALE;

/// Sizes and policies for a population/depletion run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// Size of the index range `[0, elements)` split between workers.
	pub elements: u64,
	/// Number of workers per batch.
	pub workers: usize,
	/// Depletion draws values from `[0, removal_upper_bound)`.
	pub removal_upper_bound: u64,
	/// How workers turn indices into values.
	pub strategy: ValueStrategy,
	/// What happens to indices left over by the integer division.
	pub remainder: Remainder,
	/// Base seed for the per-worker generators. `None` seeds from the OS.
	pub seed: Option<u64>,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			elements: DEFAULT_ELEMENTS,
			workers: DEFAULT_WORKERS,
			removal_upper_bound: DEFAULT_REMOVAL_UPPER_BOUND,
			strategy: ValueStrategy::default(),
			remainder: Remainder::default(),
			seed: None,
		}
	}
}

impl Config {
	/// Parses a JSON document. Missing fields take their defaults.
	pub fn from_json(json: &str) -> Result<Self> {
		let config: Config = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads and parses a JSON file.
	pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
		let json = std::fs::read_to_string(path)?;
		Self::from_json(&json)
	}

	/// Checks that both batches can run.
	pub fn validate(&self) -> Result<()> {
		if self.workers == 0 {
			return Err(Error::NoWorkers);
		}
		if self.removal_upper_bound == 0 {
			return Err(Error::EmptyRemovalRange);
		}
		if self.elements > MAX_ELEMENTS {
			return Err(Error::TooManyElements {
				elements: self.elements,
				max: MAX_ELEMENTS,
			});
		}
		Ok(())
	}
}
