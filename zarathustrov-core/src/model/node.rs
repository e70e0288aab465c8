use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::sampler::weighted_choice;
use super::token::is_punctuation;
use crate::error::ModelError;

/// Successor counts observed after one key of the tree.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Responsibilities:
/// - Accumulate successor occurrences during learning
/// - Draw the next token using weighted random sampling
///
/// ## Invariants
/// - `appearances` equals the sum of all successor counts
/// - Each successor count is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Node {
	/// Total number of recorded transitions out of this key.
	appearances: u64,
	/// Outgoing transitions indexed by the next token.
	/// Example: { "cat" => 2, "." => 1 }
	successors: BTreeMap<String, u64>,
}

impl Node {
	/// Creates a new empty node.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records an occurrence of a transition toward `value`.
	///
	/// The total is bumped alongside the entry, never recomputed.
	pub fn add(&mut self, value: &str) {
		self.appearances += 1;
		match self.successors.get_mut(value) {
			Some(occurrence) => *occurrence += 1,
			None => {
				self.successors.insert(value.to_owned(), 1);
			}
		}
	}

	/// Total number of transitions recorded out of this node.
	pub fn appearances(&self) -> u64 {
		self.appearances
	}

	/// Count for a single successor, 0 when never seen.
	pub fn count(&self, value: &str) -> u64 {
		self.successors.get(value).copied().unwrap_or(0)
	}

	/// Iterates over `(successor, count)` pairs.
	pub fn successors(&self) -> impl Iterator<Item = (&str, u64)> {
		self.successors.iter().map(|(k, v)| (k.as_str(), *v))
	}

	pub fn len(&self) -> usize {
		self.successors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.successors.is_empty()
	}

	/// Draws a successor with probability proportional to its count.
	///
	/// # Errors
	/// Returns `EmptyDistribution` if the node has no transitions.
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&str, ModelError> {
		weighted_choice(rng, self.appearances, self.successors())
	}

	/// Draws a successor among the entries `exclude` lets through, reweighted
	/// so the remaining counts keep their relative proportions.
	///
	/// # Errors
	/// Returns `EmptyDistribution` if every entry is excluded.
	pub fn sample_excluding<R, F>(&self, rng: &mut R, exclude: F) -> Result<&str, ModelError>
	where
		R: Rng + ?Sized,
		F: Fn(&str) -> bool,
	{
		let excluded: u64 = self
			.successors()
			.filter(|&(token, _)| exclude(token))
			.map(|(_, occurrence)| occurrence)
			.sum();
		let effective_total = self.appearances.saturating_sub(excluded);

		weighted_choice(
			rng,
			effective_total,
			self.successors().filter(|&(token, _)| !exclude(token)),
		)
	}

	/// Draws a successor that is a word, skipping terminators and separators.
	pub fn sample_word<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&str, ModelError> {
		self.sample_excluding(rng, is_punctuation)
	}

	/// Rebuilds a node from raw successor counts, recomputing nothing:
	/// the caller-provided total is kept as-is so it can be checked.
	pub(crate) fn from_parts(appearances: u64, successors: BTreeMap<String, u64>) -> Self {
		Self { appearances, successors }
	}

	/// Returns true when the stored total matches the successor counts
	/// and no successor has a zero count.
	pub fn is_consistent(&self) -> bool {
		let sum: u64 = self.successors.values().sum();
		sum == self.appearances && self.successors.values().all(|occurrence| *occurrence > 0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn node(entries: &[(&str, u64)]) -> Node {
		let mut node = Node::new();
		for (token, occurrence) in entries {
			for _ in 0..*occurrence {
				node.add(token);
			}
		}
		node
	}

	#[test]
	fn test_add_keeps_total_in_sync() {
		let mut node = Node::new();
		for (i, token) in ["cat", "dog", "cat", ".", "cat"].iter().enumerate() {
			node.add(token);
			assert_eq!(node.appearances(), i as u64 + 1);
			assert!(node.is_consistent());
		}
		assert_eq!(node.count("cat"), 3);
		assert_eq!(node.count("dog"), 1);
		assert_eq!(node.count("."), 1);
		assert_eq!(node.count("bird"), 0);
	}

	#[test]
	fn test_empty_node_cannot_sample() {
		let mut rng = StdRng::seed_from_u64(0);
		assert!(matches!(Node::new().sample(&mut rng), Err(ModelError::EmptyDistribution)));
	}

	#[test]
	fn test_sample_word_skips_punctuation() {
		let mut rng = StdRng::seed_from_u64(5);
		let node = node(&[(".", 50), (",", 30), ("then", 1)]);
		for _ in 0..500 {
			assert_eq!(node.sample_word(&mut rng).unwrap(), "then");
		}
	}

	#[test]
	fn test_sample_word_on_punctuation_only_node() {
		let mut rng = StdRng::seed_from_u64(5);
		let node = node(&[(".", 2), ("!", 1)]);
		assert!(matches!(node.sample_word(&mut rng), Err(ModelError::EmptyDistribution)));
	}

	#[test]
	fn test_sample_is_weighted() {
		let mut rng = StdRng::seed_from_u64(2024);
		let node = node(&[("rare", 1), ("common", 9)]);
		let draws = 100_000;
		let common = (0..draws)
			.filter(|_| node.sample(&mut rng).unwrap() == "common")
			.count();
		let observed = common as f64 / draws as f64;
		assert!((observed - 0.9).abs() < 0.01, "observed {observed}");
	}

	#[test]
	fn test_reweighted_sample_keeps_proportions() {
		let mut rng = StdRng::seed_from_u64(99);
		let node = node(&[("a", 1), ("b", 3), (".", 96)]);
		let draws = 100_000;
		let b = (0..draws)
			.filter(|_| node.sample_word(&mut rng).unwrap() == "b")
			.count();
		let observed = b as f64 / draws as f64;
		assert!((observed - 0.75).abs() < 0.01, "observed {observed}");
	}
}
