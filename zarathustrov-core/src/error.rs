//! Error types for model construction and text generation

use thiserror::Error;

/// Errors raised while building, persisting, or sampling a `Tree`.
#[derive(Debug, Error)]
pub enum ModelError {
	/// A weighted draw was requested over zero effective weight
	#[error("Cannot sample from an empty distribution")]
	EmptyDistribution,

	/// The tree holds no transitions at all, nothing can be generated from it
	#[error("Tree is empty: the corpus produced no word pairs")]
	DegenerateTree,

	/// Every generation attempt ran into the length bound without a sentence terminator
	#[error("No sentence terminator reached after {attempts} attempts")]
	NoTerminator { attempts: usize },

	/// The requested byte window does not fit the corpus
	#[error("Invalid corpus range {start}..{end} for {len} bytes")]
	InvalidRange { start: usize, end: usize, len: usize },

	/// Generator parameters are unusable
	#[error("Invalid generator configuration: {0}")]
	InvalidConfig(String),

	/// A snapshot was read back but its counters disagree
	#[error("Corrupt tree snapshot: {0}")]
	CorruptSnapshot(String),

	/// IO error (corpus, snapshot or cache files)
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON snapshot encoding error
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Binary cache encoding error
	#[error("Binary cache error: {0}")]
	Postcard(#[from] postcard::Error),
}

impl ModelError {
	/// Check if this error only ends the current generation attempt
	///
	/// A dead end while walking the tree is recoverable by starting over;
	/// everything else points at the corpus, the configuration or the disk.
	pub fn is_dead_end(&self) -> bool {
		matches!(self, ModelError::EmptyDistribution)
	}
}
