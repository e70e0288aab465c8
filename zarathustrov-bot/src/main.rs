use std::io;
use std::thread;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use env_logger::Env;
use log::{LevelFilter, error, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use zarathustrov_core::model::cache;
use zarathustrov_core::{Generator, ModelBuilder, Tree};

mod config;
mod poster;

use config::BotConfig;
use poster::{DryRunPoster, HttpPoster, Poster};

fn main() -> Result<()> {
	let config = BotConfig::parse();
	init_logging(config.verbose, config.quiet)?;

	config.validate().map_err(|e| anyhow!(e)).context("invalid configuration")?;

	let tree = load_tree(&config)?;
	let generator = Generator::new(&tree, config.generator_config()).context("cannot generate from this corpus")?;

	let mut rng = match config.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_os_rng(),
	};

	let mut poster: Box<dyn Poster> = if config.dry_run {
		Box::new(DryRunPoster::new(io::stdout()))
	} else {
		Box::new(HttpPoster::new(config.poster_config()).context("cannot create HTTP client")?)
	};

	loop {
		if let Err(e) = post_once(&generator, &mut rng, poster.as_mut()) {
			error!("{:#}", e);
			return Err(e);
		}
		if config.once {
			return Ok(());
		}
		info!("Next post in {} minutes", config.interval_minutes);
		thread::sleep(config.interval());
	}
}

/// Sets up `env_logger` from `RUST_LOG` (default `info`); `-v`/`-q` override the level.
fn init_logging(verbose: u8, quiet: u8) -> Result<()> {
	let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
	builder.format_timestamp_millis();
	if let Some(level) = verbosity_override(verbose, quiet) {
		builder.filter_level(level);
	}
	builder.try_init().context("cannot initialise logging")
}

/// Level forced by the command line flags, if any.
fn verbosity_override(verbose: u8, quiet: u8) -> Option<LevelFilter> {
	match (verbose, quiet) {
		(0, 0) => None,
		(_, 1) => Some(LevelFilter::Warn),
		(_, q) if q > 1 => Some(LevelFilter::Error),
		(1, _) => Some(LevelFilter::Debug),
		_ => Some(LevelFilter::Trace),
	}
}

/// Builds (or loads from cache) the tree and writes the snapshot if asked.
fn load_tree(config: &BotConfig) -> Result<Tree> {
	let tree = if config.no_cache {
		ModelBuilder::from_file(&config.corpus, config.range())
	} else {
		cache::load_or_build(&config.corpus, config.range())
	}
	.with_context(|| format!("cannot load corpus {}", config.corpus.display()))?;

	if let Some(path) = &config.snapshot {
		tree.write_snapshot(path)
			.with_context(|| format!("cannot write snapshot {}", path.display()))?;
	}

	Ok(tree)
}

/// Generates one post and hands it to the poster.
fn post_once<R: Rng + ?Sized>(generator: &Generator<'_>, rng: &mut R, poster: &mut dyn Poster) -> Result<String> {
	let text = generator.generate(rng).context("generation failed")?;
	info!("Generated post ({} bytes): {}", text.len(), text);
	poster.post(&text).context("posting failed")?;
	Ok(text)
}
