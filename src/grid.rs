use std::fmt;

use crate::Cell;

/// Von Neumann neighbourhood, in the order grains are handed out.
pub static EDGES: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Cell position. Ordered by `x`, then by `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Coord {
	pub x: usize,
	pub y: usize,
}

impl Coord {
	pub fn new(x: usize, y: usize) -> Coord {
		Coord { x, y }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
	pub width: usize,
	pub height: usize,
}

impl Dimensions {
	pub fn new(width: usize, height: usize) -> Dimensions {
		Dimensions { width, height }
	}

	/// Number of cells, or `None` if it does not fit in `usize`.
	pub fn cell_count(&self) -> Option<usize> {
		self.width.checked_mul(self.height)
	}

	pub fn contains(&self, c: Coord) -> bool {
		c.x < self.width && c.y < self.height
	}

	pub fn center(&self) -> Coord {
		Coord::new(self.width / 2, self.height / 2)
	}

	/// Row-major position of `c`.
	pub fn index(&self, c: Coord) -> usize {
		assert!(self.contains(c), "Coordinates ({}, {}) out of bounds (0..{}, 0..{})", c.x, c.y, self.width, self.height);
		c.x + self.width * c.y
	}

	pub fn coord(&self, index: usize) -> Coord {
		Coord::new(index % self.width, index / self.width)
	}

	/// In-bounds neighbours of `c`. Grains sent past the edge are lost.
	pub fn neighbours(self, c: Coord) -> impl Iterator<Item = Coord> {
		EDGES.iter().filter_map(move |&(dx, dy)| {
			let x = (c.x as isize).checked_add(dx)?;
			let y = (c.y as isize).checked_add(dy)?;
			if x < 0 || y < 0 {
				return None
			}
			let n = Coord::new(x as usize, y as usize);
			if self.contains(n) { Some(n) } else { None }
		})
	}
}

/// Dense pile heights, stored row by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
	dims: Dimensions,
	cells: Vec<Cell>,
}

impl Grid {
	pub fn new(dims: Dimensions) -> Grid {
		assert!(dims.width > 0 && dims.height > 0, "Empty grid");
		let len = match dims.cell_count() {
			Some(len) => len,
			None => panic!("Grid {}x{} too large", dims.width, dims.height),
		};
		Grid {
			dims,
			cells: vec![0; len],
		}
	}

	pub fn dims(&self) -> Dimensions {
		self.dims
	}

	pub fn width(&self) -> usize {
		self.dims.width
	}

	pub fn height(&self) -> usize {
		self.dims.height
	}

	pub fn get(&self, c: Coord) -> Cell {
		self.cells[self.dims.index(c)]
	}

	pub fn set(&mut self, c: Coord, height: Cell) {
		let i = self.dims.index(c);
		self.cells[i] = height;
	}

	/// Adds `delta` grains to `c` and returns the new height.
	pub fn add(&mut self, c: Coord, delta: Cell) -> Cell {
		let i = self.dims.index(c);
		self.cells[i] += delta;
		self.cells[i]
	}

	pub fn cells(&self) -> &[Cell] {
		&self.cells
	}

	fn rows(&self) -> std::slice::Chunks<'_, Cell> {
		self.cells.chunks(self.dims.width)
	}

	/// Total number of grains on the grid.
	pub fn mass(&self) -> u128 {
		self.cells.iter().map(|&h| h as u128).sum()
	}

	pub fn is_stable(&self, modulo: Cell) -> bool {
		self.cells.iter().all(|&h| h < modulo)
	}

	pub fn max_height(&self) -> Cell {
		self.cells.iter().copied().max().unwrap_or(0)
	}

	/// Coordinates holding at least `threshold` grains, in `Coord` order.
	pub fn at_least(&self, threshold: Cell) -> Vec<Coord> {
		let mut found: Vec<_> = self.cells.iter()
			.enumerate()
			.filter(|&(_, &h)| h >= threshold)
			.map(|(i, _)| self.dims.coord(i))
			.collect();
		found.sort_unstable();
		found
	}
}

impl fmt::Display for Grid {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let vis = [' ', '.', ':', '&'];
		for row in self.rows() {
			let line: String = row.iter()
				.map(|&h| match vis.get(h as usize) {
					Some(&c) => c,
					None => std::char::from_digit((h % 36) as u32, 36).unwrap_or('#'),
				})
				.collect();
			writeln!(f, "{}", line)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn add_returns_new_height() {
		let mut g = Grid::new(Dimensions::new(3, 2));
		let c = Coord::new(2, 1);
		assert_eq!(g.add(c, 3), 3);
		assert_eq!(g.add(c, 2), 5);
		assert_eq!(g.get(c), 5);
		g.set(c, 1);
		assert_eq!(g.get(c), 1);
		assert_eq!(g.cells()[5], 1);
	}

	#[test]
	#[should_panic(expected = "out of bounds")]
	fn out_of_bounds_access_panics() {
		let g = Grid::new(Dimensions::new(3, 3));
		g.get(Coord::new(3, 0));
	}

	#[test]
	fn cell_count_overflow() {
		assert_eq!(Dimensions::new(3, 7).cell_count(), Some(21));
		assert_eq!(Dimensions::new(usize::MAX, 2).cell_count(), None);
	}

	#[test]
	#[should_panic(expected = "too large")]
	fn oversized_grid_panics() {
		Grid::new(Dimensions::new(usize::MAX / 2, 3));
	}

	#[test]
	fn neighbours_stop_at_edges() {
		let dims = Dimensions::new(3, 3);
		let corner: Vec<_> = dims.neighbours(Coord::new(0, 0)).collect();
		assert_eq!(corner, vec![Coord::new(1, 0), Coord::new(0, 1)]);
		let middle: Vec<_> = dims.neighbours(Coord::new(1, 1)).collect();
		assert_eq!(middle, vec![Coord::new(0, 1), Coord::new(2, 1), Coord::new(1, 0), Coord::new(1, 2)]);
		let far: Vec<_> = dims.neighbours(Coord::new(2, 2)).collect();
		assert_eq!(far, vec![Coord::new(1, 2), Coord::new(2, 1)]);
	}

	#[test]
	fn center_uses_integer_division() {
		assert_eq!(Dimensions::new(1001, 1001).center(), Coord::new(500, 500));
		assert_eq!(Dimensions::new(4, 7).center(), Coord::new(2, 3));
	}

	#[test]
	fn coords_order_by_x_first() {
		let mut v = vec![Coord::new(1, 0), Coord::new(0, 2), Coord::new(0, 1)];
		v.sort();
		assert_eq!(v, vec![Coord::new(0, 1), Coord::new(0, 2), Coord::new(1, 0)]);
	}

	#[test]
	fn at_least_is_sorted() {
		let mut g = Grid::new(Dimensions::new(3, 3));
		g.set(Coord::new(2, 0), 4);
		g.set(Coord::new(0, 2), 7);
		g.set(Coord::new(1, 1), 3);
		assert_eq!(g.at_least(4), vec![Coord::new(0, 2), Coord::new(2, 0)]);
	}

	#[test]
	fn ascii() {
		let mut g = Grid::new(Dimensions::new(3, 2));
		g.set(Coord::new(0, 0), 1);
		g.set(Coord::new(1, 0), 3);
		g.set(Coord::new(2, 1), 5);
		assert_eq!(g.to_string(), ".& \n  5\n");
	}
}
