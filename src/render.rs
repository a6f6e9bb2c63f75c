use std::{
	fs::File,
	path::Path,
};

use log::info;
use rayon::prelude::*;

use crate::{
	Cell,
	error::{Result, SandpileError},
	grid::Grid,
};

pub type Color = [u8; 3];

/// Colors indexed by stable pile height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
	colors: Vec<Color>,
}

impl Default for Palette {
	fn default() -> Palette {
		Palette::new(vec![
			[0, 0, 0],
			[64, 128, 0],
			[118, 8, 170],
			[255, 214, 0],
		])
	}
}

impl Palette {
	pub fn new(colors: Vec<Color>) -> Palette {
		Palette { colors }
	}

	/// Black, cyan, yellow, red.
	pub fn bright() -> Palette {
		Palette::new(vec![
			[0, 0, 0],
			[0, 255, 255],
			[255, 255, 0],
			[255, 0, 0],
		])
	}

	pub fn len(&self) -> usize {
		self.colors.len()
	}

	pub fn color(&self, height: Cell) -> Option<Color> {
		self.colors.get(height as usize).copied()
	}

	/// Fails unless every height below `modulo` has a color.
	pub fn check(&self, modulo: Cell) -> Result<()> {
		if (self.colors.len() as u128) < modulo as u128 {
			return Err(SandpileError::NotEnoughColors {
				colors: self.colors.len(),
				needed: modulo,
			})
		}
		Ok(())
	}
}

/// RGBA pixels, row by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
	width: usize,
	height: usize,
	pixels: Vec<u8>,
}

impl Image {
	pub fn width(&self) -> usize {
		self.width
	}

	pub fn height(&self) -> usize {
		self.height
	}

	pub fn pixels(&self) -> &[u8] {
		&self.pixels
	}

	pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
		let p = (x + y * self.width) * 4;
		[self.pixels[p], self.pixels[p+1], self.pixels[p+2], self.pixels[p+3]]
	}

	pub fn write_png<P: AsRef<Path>>(&self, fname: P) -> Result<()> {
		let fname = fname.as_ref();
		repng::encode(File::create(fname)?, self.width as u32, self.height as u32, &self.pixels)?;
		info!("wrote {}x{} image to {}", self.width, self.height, fname.display());
		Ok(())
	}
}

/// Colors every cell of `grid` with `palette[height]`.
pub fn render(grid: &Grid, palette: &Palette) -> Result<Image> {
	let max = grid.max_height();
	if palette.color(max).is_none() {
		return Err(SandpileError::NotEnoughColors {
			colors: palette.len(),
			needed: max + 1,
		})
	}
	let (width, height) = (grid.width(), grid.height());
	let len = match grid.cells().len().checked_mul(4) {
		Some(len) => len,
		None => return Err(SandpileError::GridTooLarge(width, height)),
	};
	let mut pixels = vec![0; len];
	pixels.par_chunks_mut(width * 4)
		.zip(grid.cells().par_chunks(width))
		.for_each(|(out, row)| {
			for (px, &h) in out.chunks_exact_mut(4).zip(row) {
				let [r, g, b] = palette.colors[h as usize];
				px.copy_from_slice(&[r, g, b, 255]);
			}
		});
	Ok(Image { width, height, pixels })
}
