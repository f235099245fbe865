//! avlpool: populate an AVL tree from a pool of workers, then deplete it.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: 1000 indices, 3 workers, removals drawn below 5000
//! avlpool
//!
//! # Deterministic run that empties the tree
//! avlpool --elements 12 --workers 3 --remove-below 12 --strategy sequential
//!
//! # Start from a JSON config and override one field
//! avlpool --config workload.json --workers 8
//!
//! # Batch-level logging
//! RUST_LOG=avlpool=debug avlpool --quiet
//! ```

use std::error::Error as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

use avlpool::{BatchReport, Config, Remainder, SharedTree, Traversal, ValueStrategy, Workload};

/// Probes for the successor/predecessor report are drawn from `1..=PROBE_MAX`.
const PROBE_MAX: u64 = 100;

/// Populate an AVL tree concurrently under a single lock, then deplete it.
#[derive(Parser, Debug)]
#[command(name = "avlpool")]
#[command(about = "Concurrent AVL tree population and depletion benchmark")]
struct Cli {
	/// JSON file with a workload configuration. Flags override its fields.
	#[arg(long)]
	config: Option<PathBuf>,

	/// Size of the index range split between workers.
	#[arg(long)]
	elements: Option<u64>,

	/// Number of worker threads per batch.
	#[arg(long)]
	workers: Option<usize>,

	/// Depletion tries to remove values drawn below this bound.
	#[arg(long)]
	remove_below: Option<u64>,

	/// How indices become values.
	#[arg(long, value_enum)]
	strategy: Option<ValueStrategy>,

	/// What to do with indices that do not divide evenly between workers.
	#[arg(long, value_enum)]
	remainder: Option<Remainder>,

	/// Base seed for the worker generators.
	#[arg(long)]
	seed: Option<u64>,

	/// Skip printing traversals and individual removed values.
	#[arg(long)]
	quiet: bool,
}

impl Cli {
	fn workload(&self) -> avlpool::Result<Workload> {
		let mut config = match &self.config {
			Some(path) => Config::from_path(path)?,
			None => Config::default(),
		};
		if let Some(elements) = self.elements {
			config.elements = elements;
		}
		if let Some(workers) = self.workers {
			config.workers = workers;
		}
		if let Some(bound) = self.remove_below {
			config.removal_upper_bound = bound;
		}
		if let Some(strategy) = self.strategy {
			config.strategy = strategy;
		}
		if let Some(remainder) = self.remainder {
			config.remainder = remainder;
		}
		if self.seed.is_some() {
			config.seed = self.seed;
		}
		Workload::new(config)
	}
}

fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_writer(std::io::stderr)
		.init();

	let cli = Cli::parse();
	match run(&cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			eprintln!("Error: {err}");
			let mut source = err.source();
			while let Some(cause) = source {
				eprintln!("  caused by: {cause}");
				source = cause.source();
			}
			ExitCode::FAILURE
		}
	}
}

fn run(cli: &Cli) -> avlpool::Result<()> {
	let started = Instant::now();
	let workload = cli.workload()?;
	let tree = SharedTree::new();

	let report = workload.populate(&tree)?;
	print_report(&report, tree.len());
	if !cli.quiet {
		print_values("In-order", &tree.to_vec(Traversal::InOrder));
		print_values("Pre-order", &tree.to_vec(Traversal::PreOrder));
		print_values("Post-order", &tree.to_vec(Traversal::PostOrder));
	}

	let report = workload.deplete(&tree, |value| {
		if !cli.quiet {
			println!("Removed: {value}");
		}
	})?;
	print_report(&report, tree.len());
	if !cli.quiet {
		print_values("In-order after removals", &tree.to_vec(Traversal::InOrder));
	}

	let probe = match workload.config().seed {
		Some(seed) => StdRng::seed_from_u64(seed).random_range(1..=PROBE_MAX),
		None => rand::rng().random_range(1..=PROBE_MAX),
	};
	let (successor, predecessor) = tree.successor_and_predecessor(&probe);
	match successor {
		Some(value) => println!("Successor of {probe}: {value}"),
		None => println!("No successor for {probe}"),
	}
	match predecessor {
		Some(value) => println!("Predecessor of {probe}: {value}"),
		None => println!("No predecessor for {probe}"),
	}

	match (tree.min(), tree.max()) {
		(Some(min), Some(max)) => {
			println!("Minimum: {min}");
			println!("Maximum: {max}");
		}
		_ => println!("The tree is empty, there is no minimum or maximum"),
	}

	println!("Total time: {:.6} seconds", started.elapsed().as_secs_f64());
	Ok(())
}

fn print_report(report: &BatchReport, len: usize) {
	println!(
		"{}: {} workers, {} attempted, {} applied, {} values in tree ({:?})",
		report.kind,
		report.workers.len(),
		report.attempted(),
		report.applied(),
		len,
		report.elapsed
	);
}

fn print_values(label: &str, values: &[u64]) {
	let line = values.iter().map(u64::to_string).collect::<Vec<_>>().join(" ");
	println!("{label}:\n{line}");
}
