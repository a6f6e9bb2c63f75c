use std::io;

use crate::Cell;

/// Everything that can stop a run before or after toppling.
#[derive(Debug, thiserror::Error)]
pub enum SandpileError {
	/// The palette cannot color every stable height.
	#[error("not enough colors: palette has {colors}, {needed} needed")]
	NotEnoughColors { colors: usize, needed: Cell },
	#[error("toppling threshold must be at least 2, got {0}")]
	InvalidModulo(Cell),
	#[error("grid dimensions must be positive, got {0}x{1}")]
	EmptyGrid(usize, usize),
	#[error("grid {0}x{1} is too large")]
	GridTooLarge(usize, usize),
	#[error("can't start worker pool: {0}")]
	ThreadPool(#[from] rayon::ThreadPoolBuildError),
	#[error("io error: {0}")]
	Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, SandpileError>;
