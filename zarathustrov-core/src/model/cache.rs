use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::builder::{CorpusRange, ModelBuilder};
use super::tree::Tree;
use crate::error::ModelError;
use crate::io::{build_output_path, write_file};

/// Binary cache record: the tree plus what it was built from.
///
/// A cache entry is only reused when both the window and the corpus
/// size still match; anything else triggers a rebuild.
#[derive(Serialize, Deserialize, Debug)]
struct CachedTree {
	range: CorpusRange,
	corpus_len: u64,
	tree: Tree,
}

/// Loads a tree from the binary cache next to the corpus if it is still
/// valid, otherwise builds it from the corpus and refreshes the cache.
///
/// - `corpus_path` is the input text file.
/// - The cache lives at the same path with a `.bin` extension.
/// - Uses `postcard` for compact serialization/deserialization.
///
/// # Errors
/// Returns an error if the corpus cannot be read, the range is invalid,
/// or the cache cannot be written. An unreadable cache is not an error,
/// it is rebuilt.
pub fn load_or_build<P: AsRef<Path>>(corpus_path: P, range: CorpusRange) -> Result<Tree, ModelError> {
	let cache_path = build_output_path(&corpus_path, "bin")?;
	load_or_build_at(corpus_path, cache_path, range)
}

/// Same as `load_or_build` with an explicit cache location.
pub fn load_or_build_at<PC, PB>(corpus_path: PC, cache_path: PB, range: CorpusRange) -> Result<Tree, ModelError>
where
	PC: AsRef<Path>,
	PB: AsRef<Path>,
{
	let corpus_len = fs::metadata(&corpus_path)?.len();

	if cache_path.as_ref().exists() {
		match read_cache(&cache_path) {
			Ok(cached) if cached.range == range && cached.corpus_len == corpus_len => {
				info!("Loaded cached tree from {}", cache_path.as_ref().display());
				return Ok(cached.tree);
			}
			Ok(_) => info!("Cache {} is stale, rebuilding", cache_path.as_ref().display()),
			Err(e) => warn!("Ignoring unreadable cache {}: {}", cache_path.as_ref().display(), e),
		}
	}

	let tree = ModelBuilder::from_file(&corpus_path, range)?;
	let cached = CachedTree { range, corpus_len, tree };
	let bytes = postcard::to_stdvec(&cached)?;
	write_file(&cache_path, &bytes)?;

	Ok(cached.tree)
}

fn read_cache<P: AsRef<Path>>(path: P) -> Result<CachedTree, ModelError> {
	let bytes = fs::read(path)?;
	let cached: CachedTree = postcard::from_bytes(&bytes)?;
	cached.tree.check_invariants()?;
	Ok(cached)
}
