use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::node::Node;
use super::sampler::weighted_choice;
use super::token::TokenClass;
use crate::error::ModelError;

/// First-order word model: every key maps to the tokens seen right after it.
///
/// The `Tree` is filled once by a `ModelBuilder` and only read afterwards,
/// so a shared reference can be handed to any number of threads.
///
/// # Responsibilities
/// - Record `(key, value)` transitions with O(1) counter upkeep
/// - Draw a sentence-opening key weighted by how often each key was seen
/// - Expose nodes for the generator walk
///
/// # Invariants
/// - `total` equals the sum of every node's `appearances`
/// - Keys and successors are lowercase; punctuation keys never lead to words
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
	/// Number of updates applied, i.e. the sum of all node totals.
	total: u64,
	/// Mapping from a key token to its successor counts.
	nodes: BTreeMap<String, Node>,
}

impl Tree {
	/// Creates an empty tree.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one observation of `value` following `key`.
	///
	/// Empty keys or values are ignored.
	pub fn update(&mut self, key: &str, value: &str) {
		if key.is_empty() || value.is_empty() {
			return;
		}

		self.total += 1;
		match self.nodes.get_mut(key) {
			Some(node) => node.add(value),
			None => {
				let mut node = Node::new();
				node.add(value);
				self.nodes.insert(key.to_owned(), node);
			}
		}
	}

	/// Global appearance counter used to weight the first key of a sentence.
	pub fn total(&self) -> u64 {
		self.total
	}

	/// Number of distinct keys.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Returns the node for `key`, if the key was ever followed by something.
	pub fn node(&self, key: &str) -> Option<&Node> {
		self.nodes.get(key)
	}

	/// Iterates over `(key, node)` pairs in key order.
	pub fn nodes(&self) -> impl Iterator<Item = (&str, &Node)> {
		self.nodes.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Draws a key with probability proportional to its node total.
	///
	/// # Errors
	/// Returns `EmptyDistribution` if the tree is empty.
	pub fn sample_key<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&str, ModelError> {
		weighted_choice(
			rng,
			self.total,
			self.nodes.iter().map(|(key, node)| (key.as_str(), node.appearances())),
		)
	}

	/// Verifies every counter of the tree.
	///
	/// # Errors
	/// Returns `CorruptSnapshot` describing the first mismatch found.
	pub fn check_invariants(&self) -> Result<(), ModelError> {
		let mut sum = 0u64;
		for (key, node) in &self.nodes {
			if !node.is_consistent() {
				return Err(ModelError::CorruptSnapshot(format!(
					"node '{}' total {} does not match its successors",
					key,
					node.appearances()
				)));
			}
			if TokenClass::of(key).is_punctuation()
				&& node.successors().any(|(value, _)| !TokenClass::of(value).is_punctuation())
			{
				return Err(ModelError::CorruptSnapshot(format!(
					"punctuation key '{}' leads to a word",
					key
				)));
			}
			sum += node.appearances();
		}

		if sum != self.total {
			return Err(ModelError::CorruptSnapshot(format!(
				"tree total {} does not match node totals {}",
				self.total, sum
			)));
		}

		Ok(())
	}

	/// Rebuilds a tree from raw parts without recomputing any counter.
	pub(crate) fn from_parts(total: u64, nodes: BTreeMap<String, Node>) -> Self {
		Self { total, nodes }
	}
}
