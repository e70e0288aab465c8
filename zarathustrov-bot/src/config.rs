//! Bot configuration and validation
//!
//! Every option can come from the command line or the environment.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use zarathustrov_core::{CorpusRange, GeneratorConfig};

use crate::poster::PosterConfig;

/// Configuration for the posting bot
#[derive(Parser, Debug, Clone)]
#[command(name = "zarathustrov-bot", about = "Posts Markov-generated text on a schedule")]
pub struct BotConfig {
	// === Corpus ===
	/// Corpus text file
	#[arg(long, env = "ZARATHUSTROV_CORPUS", default_value = "assets/corpus.txt")]
	pub corpus: PathBuf,

	/// First byte of the corpus to learn from (skips front matter)
	#[arg(long, env = "ZARATHUSTROV_START", default_value = "0")]
	pub start: usize,

	/// Byte after the last one to learn from (skips the afterword); defaults to end of file
	#[arg(long, env = "ZARATHUSTROV_END")]
	pub end: Option<usize>,

	/// Write a JSON snapshot of the tree to this path
	#[arg(long, env = "ZARATHUSTROV_SNAPSHOT")]
	pub snapshot: Option<PathBuf>,

	/// Always rebuild the tree instead of using the binary cache next to the corpus
	#[arg(long)]
	pub no_cache: bool,

	// === Generation ===
	/// Maximum post length
	#[arg(long, default_value = "280")]
	pub max_len: usize,

	/// Attempts before giving up on a post
	#[arg(long, default_value = "64")]
	pub max_attempts: usize,

	/// Words always capitalized (repeatable or comma separated)
	#[arg(long = "proper-noun", value_delimiter = ',', default_values_t = [String::from("i"), String::from("zarathustra")])]
	pub proper_nouns: Vec<String>,

	/// Seed for the random generator (OS entropy when absent)
	#[arg(long, env = "ZARATHUSTROV_SEED")]
	pub seed: Option<u64>,

	// === Scheduling ===
	/// Minutes between two posts
	#[arg(long, env = "ZARATHUSTROV_INTERVAL_MINUTES", default_value = "60")]
	pub interval_minutes: u64,

	/// Post a single time and exit
	#[arg(long)]
	pub once: bool,

	// === Posting ===
	/// Print posts to stdout instead of sending them
	#[arg(long)]
	pub dry_run: bool,

	/// Endpoint receiving `{"text": ...}` POST requests
	#[arg(long, env = "ZARATHUSTROV_POST_ENDPOINT", default_value = "https://api.twitter.com/2/tweets")]
	pub endpoint: String,

	/// Bearer token for the posting endpoint
	#[arg(long, env = "ZARATHUSTROV_ACCESS_TOKEN", hide_env_values = true)]
	pub access_token: Option<String>,

	/// Posting request timeout (seconds)
	#[arg(long, default_value = "10")]
	pub timeout_secs: u64,

	// === Logging ===
	/// Increase verbosity (-v, -vv)
	#[arg(short = 'v', long, action = ArgAction::Count)]
	pub verbose: u8,

	/// Decrease verbosity (-q, -qq)
	#[arg(short = 'q', long, action = ArgAction::Count)]
	pub quiet: u8,
}

impl BotConfig {
	/// Validate the configuration at startup
	pub fn validate(&self) -> Result<(), String> {
		if let Some(end) = self.end {
			if end < self.start {
				return Err(format!("--end ({}) must be >= --start ({})", end, self.start));
			}
		}

		if self.max_len == 0 {
			return Err("--max-len must be > 0".to_string());
		}
		if self.max_attempts == 0 {
			return Err("--max-attempts must be > 0".to_string());
		}
		if self.interval_minutes == 0 && !self.once {
			return Err("--interval-minutes must be > 0".to_string());
		}

		if !self.dry_run {
			if self.access_token.as_deref().is_none_or(str::is_empty) {
				return Err("an access token is required unless --dry-run is set".to_string());
			}
			if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
				return Err(format!("endpoint must be an http(s) URL, got {}", self.endpoint));
			}
		}

		Ok(())
	}

	/// Corpus window to learn from
	pub fn range(&self) -> CorpusRange {
		CorpusRange::new(self.start, self.end)
	}

	/// Generator parameters
	pub fn generator_config(&self) -> GeneratorConfig {
		GeneratorConfig {
			max_len: self.max_len,
			max_attempts: self.max_attempts,
			..GeneratorConfig::default()
		}
		.with_proper_nouns(&self.proper_nouns)
	}

	/// Posting collaborator parameters
	pub fn poster_config(&self) -> PosterConfig {
		PosterConfig {
			endpoint: self.endpoint.clone(),
			access_token: self.access_token.clone().unwrap_or_default(),
			timeout: Duration::from_secs(self.timeout_secs),
		}
	}

	/// Delay between two posts
	pub fn interval(&self) -> Duration {
		Duration::from_secs(self.interval_minutes * 60)
	}
}
