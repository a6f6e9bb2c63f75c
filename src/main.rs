use sandpile_topple::{
	parallel::DEFAULT_WORKERS,
	render,
	Cell,
	Grid,
	Palette,
	Parallel,
	Result,
	Sequential,
	Simulation,
	ToppleStats,
};

use std::time::Instant;

fn main() {
	env_logger::init();
	let config = match Config::new(&mut std::env::args()) {
		Ok(config) => config,
		Err(e) => {
			println!("{}", e);
			return
		}
	};
	if let Err(e) = run(&config) {
		println!("{}", e);
	}
}

fn run(config: &Config) -> Result<()> {
	let defaults = Simulation::default();
	let simulation = Simulation::new(defaults.modulo(), config.initial_stack, config.dimensions)?;
	let palette = Palette::bright();
	let start = Instant::now();
	let (grid, stats) = match config.engine {
		Engine::Sequential => simulation.run(&Sequential, &palette)?,
		Engine::Parallel(workers) => simulation.run(&Parallel::new(workers)?, &palette)?,
	};
	report(start.elapsed().as_secs_f64(), &stats, config.engine);
	match config.output {
		Output::Ascii => print!("{}", grid),
		Output::Png(ref filename) => write(&grid, &palette, filename)?,
	}
	Ok(())
}

fn report(seconds: f64, stats: &ToppleStats, engine: Engine) {
	println!("{} seconds", seconds);
	println!("{} iterations", stats.topplings);
	println!("{} max nbhd size", stats.max_pending);
	if let Engine::Parallel(_) = engine {
		println!("{} rounds", stats.rounds);
	}
}

fn write(grid: &Grid, palette: &Palette, filename: &str) -> Result<()> {
	render(grid, palette)?.write_png(filename)
}

#[derive(Debug, PartialEq)]
struct Config {
	initial_stack: Cell,
	dimensions: (usize, usize),
	engine: Engine,
	output: Output,
}

#[derive(Debug, PartialEq, Clone, Copy)]
enum Engine {
	Sequential,
	Parallel(usize),
}

#[derive(Debug, PartialEq)]
enum Output {
	Ascii,
	Png(String),
}

impl Config {
	fn new(args: &mut dyn Iterator<Item = String>) -> std::result::Result<Config, String> {
		args.next();
		let defaults = Simulation::default();
		let initial_stack = match args.next() {
			Some(s) => match s.parse::<Cell>() {
				Ok(n) => n,
				Err(_e) => return Err(format!("Initial stack must be a non-negative 64-bit number. Got: {}", s)),
			},
			None => defaults.initial_stack(),
		};
		let dimensions = match args.next() {
			Some(s) => match parse_size(&s) {
				Some(dim) => dim,
				None => return Err(format!("Please specify grid size as '1001' or '200x100'. Got: {}", s)),
			},
			None => (defaults.dims().width, defaults.dims().height),
		};
		let engine = match args.next() {
			Some(ref s) if s == "sequential" || s == "cpu" => Engine::Sequential,
			Some(ref s) if s == "parallel" => Engine::Parallel(DEFAULT_WORKERS),
			Some(ref s) if s.starts_with("parallel-") => match s["parallel-".len()..].parse::<usize>() {
				Ok(n) if n > 0 => Engine::Parallel(n),
				_ => return Err("In engine 'parallel-N', N must be a positive number of workers.".to_owned()),
			},
			Some(s) => return Err(format!("Expected engine 'sequential', 'parallel', or 'parallel-N'. Got: {}", s)),
			None => Engine::Sequential,
		};
		let output = match args.next() {
			Some(ref s) if s == "ascii" => Output::Ascii,
			Some(s) => Output::Png(s),
			None => Output::Png("output.cpu.png".to_owned()),
		};
		if let Some(s) = args.next() {
			return Err(format!("Unexpected argument: {}", s))
		}
		Ok(Config {
			initial_stack,
			dimensions,
			engine,
			output,
		})
	}
}

fn parse_size(s: &str) -> Option<(usize, usize)> {
	if let Ok(x) = s.parse::<usize>() {
		if x > 0 {
			return Some((x, x))
		}
		return None
	}
	let sx: Vec<_> = s.split('x').collect();
	if sx.len() != 2 {
		return None
	}
	if let (Ok(x), Ok(y)) = (sx[0].parse::<usize>(), sx[1].parse::<usize>()) {
		if x > 0 && y > 0 {
			return Some((x, y))
		}
	}
	None
}
