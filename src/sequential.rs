use std::collections::BTreeSet;

use log::{debug, info};

use crate::{
	Cell,
	Toppler,
	ToppleStats,
	grid::Grid,
};

/// Single-threaded engine that only visits cells known to be over the threshold.
///
/// Pending cells are kept in a set ordered by `Coord`, so the smallest `x`
/// (then smallest `y`) topples first. The order decides the visiting sequence
/// only; the stable configuration is the same for any order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl Toppler for Sequential {
	fn stabilize(&self, grid: &mut Grid, modulo: Cell) -> ToppleStats {
		let dims = grid.dims();
		let mut dirty: BTreeSet<_> = grid.at_least(modulo).into_iter().collect();
		debug!("sequential: {} cells over threshold {} on {}x{}", dirty.len(), modulo, dims.width, dims.height);
		let mut stats = ToppleStats {
			max_pending: dirty.len(),
			..ToppleStats::default()
		};
		while let Some(i) = dirty.pop_first() {
			// Height may have grown since `i` was queued.
			let stack = grid.get(i);
			let left = stack % modulo;
			let d = (stack - left) / modulo;
			grid.set(i, left);
			stats.topplings += 1;
			if d == 0 {
				continue
			}
			for n in dims.neighbours(i) {
				if grid.add(n, d) >= modulo {
					dirty.insert(n);
				}
			}
			stats.max_pending = stats.max_pending.max(dirty.len());
		}
		info!("sequential: stable after {} topplings, max {} pending", stats.topplings, stats.max_pending);
		stats
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::grid::{Coord, Dimensions};

	#[test]
	fn single_topple() {
		let mut g = Grid::new(Dimensions::new(5, 5));
		g.set(Coord::new(2, 2), 4);
		let stats = Sequential.stabilize(&mut g, 4);
		assert_eq!(stats.topplings, 1);
		assert_eq!(stats.rounds, 0);
		assert_eq!(g.get(Coord::new(2, 2)), 0);
		for c in &[(1, 2), (3, 2), (2, 1), (2, 3)] {
			assert_eq!(g.get(Coord::new(c.0, c.1)), 1);
		}
		for c in &[(1, 1), (3, 3), (1, 3), (3, 1)] {
			assert_eq!(g.get(Coord::new(c.0, c.1)), 0);
		}
		assert_eq!(g.mass(), 4);
	}

	#[test]
	fn large_stack_topples_in_one_visit() {
		let mut g = Grid::new(Dimensions::new(3, 3));
		g.set(Coord::new(1, 1), 13);
		Sequential.stabilize(&mut g, 4);
		assert_eq!(g.get(Coord::new(1, 1)), 1);
		assert_eq!(g.get(Coord::new(0, 1)), 3);
		assert_eq!(g.mass(), 13);
	}

	#[test]
	fn corner_loses_grains_over_the_edge() {
		let mut g = Grid::new(Dimensions::new(4, 4));
		g.set(Coord::new(0, 0), 4);
		Sequential.stabilize(&mut g, 4);
		assert_eq!(g.get(Coord::new(1, 0)), 1);
		assert_eq!(g.get(Coord::new(0, 1)), 1);
		assert_eq!(g.mass(), 2);
	}

	#[test]
	fn stable_grid_is_untouched() {
		let mut g = Grid::new(Dimensions::new(3, 3));
		g.set(Coord::new(0, 2), 3);
		let before = g.clone();
		let stats = Sequential.stabilize(&mut g, 4);
		assert_eq!(stats, ToppleStats::default());
		assert_eq!(g, before);
	}
}
