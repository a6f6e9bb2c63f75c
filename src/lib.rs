//! Abelian sandpile on a finite grid with an open boundary.
//!
//! Grains are dropped on the center cell; any cell holding `modulo` or more
//! grains topples, keeping the remainder and handing an equal share to each
//! of its four neighbours. Shares sent past the edge are lost. Two engines
//! reach the same stable configuration: [`Sequential`] and the round-based
//! [`Parallel`].

use log::debug;

pub mod error;
pub mod grid;
pub mod parallel;
pub mod render;
pub mod sequential;

pub use crate::{
	error::{Result, SandpileError},
	grid::{Coord, Dimensions, Grid},
	parallel::{Entry, Parallel},
	render::{render, Color, Image, Palette},
	sequential::Sequential,
};

/// Pile height.
pub type Cell = u64;

/// Counters reported by an engine once its grid is stable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToppleStats {
	/// Topple events; a cell toppling several times over at once counts once.
	pub topplings: u64,
	/// Largest work set seen: pending cells, or entries for round-based engines.
	pub max_pending: usize,
	/// Synchronous rounds. Zero for engines without rounds.
	pub rounds: u64,
}

pub trait Toppler {
	/// Topples `grid` until every cell is below `modulo`.
	fn stabilize(&self, grid: &mut Grid, modulo: Cell) -> ToppleStats;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Simulation {
	modulo: Cell,
	initial_stack: Cell,
	dims: Dimensions,
}

impl Default for Simulation {
	fn default() -> Simulation {
		Simulation {
			modulo: 4,
			initial_stack: 1 << 10,
			dims: Dimensions::new(1001, 1001),
		}
	}
}

impl Simulation {
	pub fn new(modulo: Cell, initial_stack: Cell, (width, height): (usize, usize)) -> Result<Simulation> {
		if modulo < 2 {
			return Err(SandpileError::InvalidModulo(modulo))
		}
		if width == 0 || height == 0 {
			return Err(SandpileError::EmptyGrid(width, height))
		}
		// One RGBA pixel per cell must be addressable too.
		if width.checked_mul(height).and_then(|n| n.checked_mul(4)).is_none() {
			return Err(SandpileError::GridTooLarge(width, height))
		}
		Ok(Simulation {
			modulo,
			initial_stack,
			dims: Dimensions::new(width, height),
		})
	}

	pub fn modulo(&self) -> Cell {
		self.modulo
	}

	pub fn initial_stack(&self) -> Cell {
		self.initial_stack
	}

	pub fn dims(&self) -> Dimensions {
		self.dims
	}

	/// Empty grid with the whole stack on the center cell.
	pub fn seed(&self) -> Grid {
		let mut grid = Grid::new(self.dims);
		grid.set(self.dims.center(), self.initial_stack);
		grid
	}

	/// Checks `palette`, then seeds and stabilizes a fresh grid with `engine`.
	pub fn run<T: Toppler>(&self, engine: &T, palette: &Palette) -> Result<(Grid, ToppleStats)> {
		palette.check(self.modulo)?;
		let mut grid = self.seed();
		debug!("{} grains at {:?} on {}x{}, threshold {}", self.initial_stack, self.dims.center(), self.dims.width, self.dims.height, self.modulo);
		let stats = engine.stabilize(&mut grid, self.modulo);
		Ok((grid, stats))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let s = Simulation::default();
		assert_eq!(s.modulo(), 4);
		assert_eq!(s.initial_stack(), 1024);
		assert_eq!(s.dims(), Dimensions::new(1001, 1001));
	}

	#[test]
	fn rejects_bad_configuration() {
		assert!(matches!(Simulation::new(1, 10, (5, 5)), Err(SandpileError::InvalidModulo(1))));
		assert!(matches!(Simulation::new(4, 10, (0, 5)), Err(SandpileError::EmptyGrid(0, 5))));
		let huge = 1usize << (usize::BITS / 2);
		assert!(matches!(Simulation::new(4, 4, (huge, huge)), Err(SandpileError::GridTooLarge(..))));
		assert!(matches!(Simulation::new(4, 4, (usize::MAX / 4 + 1, 1)), Err(SandpileError::GridTooLarge(..))));
		assert!(Simulation::new(4, 4, (usize::MAX / 4, 1)).is_ok());
	}

	#[test]
	fn seed_is_centered() {
		let g = Simulation::new(4, 7, (4, 3)).unwrap().seed();
		assert_eq!(g.get(Coord::new(2, 1)), 7);
		assert_eq!(g.mass(), 7);
	}

	#[test]
	fn small_palette_fails_before_toppling() {
		let s = Simulation::new(5, 100, (9, 9)).unwrap();
		let res = s.run(&Sequential, &Palette::default());
		assert!(matches!(res, Err(SandpileError::NotEnoughColors { colors: 4, needed: 5 })));
	}
}
