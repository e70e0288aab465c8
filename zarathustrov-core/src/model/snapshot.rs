//! JSON snapshot of a tree.
//!
//! The snapshot is a debugging artifact: generation always runs on the
//! in-memory `Tree`. Its shape keeps the totals next to the real entries:
//!
//! ```json
//! {
//!     "_appearances": { "total": 6 },
//!     "the": { "_appearances": 2, "cat": 1, "dog": 1 },
//!     "sat": { "_appearances": 1, ".": 1 }
//! }
//! ```
//!
//! `_appearances` cannot collide with a token: tokens are letters only,
//! or a single punctuation character.

use std::collections::BTreeMap;
use std::path::Path;

use log::info;

use super::node::Node;
use super::tree::Tree;
use crate::error::ModelError;
use crate::io::write_file;

/// Reserved key holding a node total (or the tree total record).
pub const APPEARANCES_KEY: &str = "_appearances";

/// Key of the global counter inside the tree-level `_appearances` record.
pub const TOTAL_KEY: &str = "total";

/// Raw snapshot shape: token → (successor → count), totals included.
pub type Snapshot = BTreeMap<String, BTreeMap<String, u64>>;

impl Tree {
	/// Converts the tree into its snapshot shape.
	pub fn to_snapshot(&self) -> Snapshot {
		let mut snapshot = Snapshot::new();
		snapshot.insert(
			APPEARANCES_KEY.to_owned(),
			BTreeMap::from([(TOTAL_KEY.to_owned(), self.total())]),
		);

		for (key, node) in self.nodes() {
			let mut entries: BTreeMap<String, u64> = node
				.successors()
				.map(|(token, occurrence)| (token.to_owned(), occurrence))
				.collect();
			entries.insert(APPEARANCES_KEY.to_owned(), node.appearances());
			snapshot.insert(key.to_owned(), entries);
		}

		snapshot
	}

	/// Rebuilds a tree from a snapshot, keeping the stored totals and
	/// checking them against the entries.
	///
	/// # Errors
	/// Returns `CorruptSnapshot` if a total is missing or any counter disagrees.
	pub fn from_snapshot(mut snapshot: Snapshot) -> Result<Self, ModelError> {
		let total = snapshot
			.remove(APPEARANCES_KEY)
			.and_then(|record| record.get(TOTAL_KEY).copied())
			.ok_or_else(|| ModelError::CorruptSnapshot(format!("missing {}.{}", APPEARANCES_KEY, TOTAL_KEY)))?;

		let mut nodes = BTreeMap::new();
		for (key, mut entries) in snapshot {
			let appearances = entries
				.remove(APPEARANCES_KEY)
				.ok_or_else(|| ModelError::CorruptSnapshot(format!("node '{}' has no {}", key, APPEARANCES_KEY)))?;
			nodes.insert(key, Node::from_parts(appearances, entries));
		}

		let tree = Tree::from_parts(total, nodes);
		tree.check_invariants()?;
		Ok(tree)
	}

	/// Serializes the snapshot as indented JSON.
	pub fn to_json(&self) -> Result<String, ModelError> {
		Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
	}

	/// Parses and validates a JSON snapshot.
	pub fn from_json(json: &str) -> Result<Self, ModelError> {
		let snapshot: Snapshot = serde_json::from_str(json)?;
		Self::from_snapshot(snapshot)
	}

	/// Writes the JSON snapshot to `path`.
	pub fn write_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
		let json = self.to_json()?;
		write_file(&path, json.as_bytes())?;
		info!("Wrote tree snapshot to {}", path.as_ref().display());
		Ok(())
	}

	/// Reads a JSON snapshot back from `path`.
	pub fn read_snapshot<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
		let json = std::fs::read_to_string(path)?;
		Self::from_json(&json)
	}
}
