use log::{debug, info, trace};
use rayon::prelude::*;

use crate::{
	Cell,
	Toppler,
	ToppleStats,
	error::Result,
	grid::{Coord, Dimensions, Grid},
};

pub const DEFAULT_WORKERS: usize = 4;

/// Grains at one cell: either what a cell kept after toppling,
/// or a share handed to it by a neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
	pub pos: Coord,
	pub amount: Cell,
}

impl Entry {
	pub fn new(pos: Coord, amount: Cell) -> Entry {
		Entry { pos, amount }
	}
}

/// Output of one worker for one round. Only that worker writes to it.
#[derive(Debug, Default)]
struct Batch {
	entries: Vec<Entry>,
	toppled: u64,
}

/// Round-synchronous engine.
///
/// Every round, all entries are split into one contiguous slice per worker.
/// Each worker topples its slice into a private `Batch`; the batches are then
/// concatenated and merged so that every cell appears at most once before
/// the next round starts.
#[derive(Debug)]
pub struct Parallel {
	workers: usize,
	pool: rayon::ThreadPool,
}

impl Parallel {
	pub fn new(workers: usize) -> Result<Parallel> {
		let workers = workers.max(1);
		let pool = rayon::ThreadPoolBuilder::new()
			.num_threads(workers)
			.thread_name(|i| format!("topple-{}", i))
			.build()?;
		Ok(Parallel { workers, pool })
	}

	pub fn workers(&self) -> usize {
		self.workers
	}

	/// Runs rounds until nothing topples and returns the final entries.
	pub fn stabilize_entries(&self, dims: Dimensions, modulo: Cell, mut entries: Vec<Entry>) -> (Vec<Entry>, ToppleStats) {
		merge(&mut entries, dims);
		let mut stats = ToppleStats {
			max_pending: entries.len(),
			..ToppleStats::default()
		};
		loop {
			let part = partition_len(entries.len(), self.workers);
			let batches: Vec<Batch> = self.pool.install(|| {
				entries.par_chunks(part)
					.map(|slice| topple_slice(slice, dims, modulo))
					.collect()
			});
			let toppled: u64 = batches.iter().map(|b| b.toppled).sum();
			if toppled == 0 {
				break
			}
			stats.rounds += 1;
			stats.topplings += toppled;
			let mut next = Vec::with_capacity(batches.iter().map(|b| b.entries.len()).sum());
			for mut b in batches {
				next.append(&mut b.entries);
			}
			merge(&mut next, dims);
			trace!("round {}: {} toppled, {} entries", stats.rounds, toppled, next.len());
			stats.max_pending = stats.max_pending.max(next.len());
			entries = next;
		}
		(entries, stats)
	}
}

impl Toppler for Parallel {
	fn stabilize(&self, grid: &mut Grid, modulo: Cell) -> ToppleStats {
		let dims = grid.dims();
		let entries: Vec<_> = grid.cells().iter()
			.enumerate()
			.filter(|&(_, &h)| h > 0)
			.map(|(i, &h)| Entry::new(dims.coord(i), h))
			.collect();
		debug!("parallel: {} seed entries, {} workers, threshold {}", entries.len(), self.workers, modulo);
		let (entries, stats) = self.stabilize_entries(dims, modulo, entries);
		// Cells never touched by an entry held zero grains and still do.
		for e in entries {
			grid.set(e.pos, e.amount);
		}
		info!("parallel: stable after {} rounds, {} topplings, max {} entries", stats.rounds, stats.topplings, stats.max_pending);
		stats
	}
}

/// Slice length giving every worker at most one contiguous slice.
fn partition_len(len: usize, workers: usize) -> usize {
	((len + workers - 1) / workers).max(1)
}

fn topple_slice(slice: &[Entry], dims: Dimensions, modulo: Cell) -> Batch {
	let mut batch = Batch {
		entries: Vec::with_capacity(slice.len() * 5),
		toppled: 0,
	};
	for e in slice {
		let left = e.amount % modulo;
		let d = (e.amount - left) / modulo;
		if d == 0 {
			batch.entries.push(*e);
			continue
		}
		batch.toppled += 1;
		batch.entries.push(Entry::new(e.pos, left));
		for n in dims.neighbours(e.pos) {
			batch.entries.push(Entry::new(n, d));
		}
	}
	batch
}

/// Sorts by row-major index and sums entries sharing a cell.
pub fn merge(entries: &mut Vec<Entry>, dims: Dimensions) {
	entries.sort_unstable_by_key(|e| dims.index(e.pos));
	entries.dedup_by(|e, kept| {
		if e.pos == kept.pos {
			kept.amount += e.amount;
			true
		} else {
			false
		}
	});
}
