use std::collections::BTreeSet;

use log::debug;
use rand::Rng;

use super::token::{TokenClass, capitalize};
use super::tree::Tree;
use crate::error::ModelError;

/// Default output bound, one social-media post.
pub const DEFAULT_MAX_LEN: usize = 280;

/// Default number of attempts before giving up on reaching a terminator.
pub const DEFAULT_MAX_ATTEMPTS: usize = 64;

/// Generation parameters.
///
/// # Invariants
/// - `max_len` and `max_attempts` are strictly positive (checked by `Generator::new`)
/// - `proper_nouns` entries are lowercase, like the tree tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
	/// Maximum length of a generated text, in bytes (tokens are ASCII).
	pub max_len: usize,

	/// Number of attempts made by `generate` before failing.
	pub max_attempts: usize,

	/// Words always written with a capital letter, wherever they appear.
	pub proper_nouns: BTreeSet<String>,
}

impl Default for GeneratorConfig {
	fn default() -> Self {
		Self {
			max_len: DEFAULT_MAX_LEN,
			max_attempts: DEFAULT_MAX_ATTEMPTS,
			proper_nouns: BTreeSet::from(["i".to_owned()]),
		}
	}
}

impl GeneratorConfig {
	/// Replaces the capitalization list, lowercasing every entry.
	pub fn with_proper_nouns<I, S>(mut self, words: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.proper_nouns = words.into_iter().map(|w| w.as_ref().to_ascii_lowercase()).collect();
		self
	}
}

/// Outcome of a single generation attempt.
enum Walk {
	/// The length bound was reached.
	Bounded,
	/// The current key led nowhere usable.
	DeadEnd,
}

/// Walks a `Tree` to produce sentence-terminated, length-bounded text.
///
/// # Responsibilities
/// - Open every sentence with a key weighted by its frequency, capitalized
/// - Follow successors until the length bound, remembering where the last
///   complete sentence ended
/// - Cut the output at that point, or start over when no sentence was completed
///
/// The generator only borrows the tree; several generators can share it.
#[derive(Debug)]
pub struct Generator<'a> {
	tree: &'a Tree,
	config: GeneratorConfig,
}

impl<'a> Generator<'a> {
	/// Creates a generator over a built tree.
	///
	/// # Errors
	/// - `DegenerateTree` if the tree holds no transitions
	/// - `InvalidConfig` if `max_len` or `max_attempts` is zero
	pub fn new(tree: &'a Tree, config: GeneratorConfig) -> Result<Self, ModelError> {
		if tree.total() == 0 {
			return Err(ModelError::DegenerateTree);
		}
		if config.max_len == 0 {
			return Err(ModelError::InvalidConfig("max_len must be > 0".to_owned()));
		}
		if config.max_attempts == 0 {
			return Err(ModelError::InvalidConfig("max_attempts must be > 0".to_owned()));
		}
		Ok(Self { tree, config })
	}

	pub fn config(&self) -> &GeneratorConfig {
		&self.config
	}

	/// Generates text, retrying until a full sentence fits in the bound.
	///
	/// # Errors
	/// - `NoTerminator` if `max_attempts` attempts all failed to complete a sentence
	/// - Any sampling error that is not a dead end
	pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, ModelError> {
		for attempt in 1..=self.config.max_attempts {
			match self.attempt(rng)? {
				Some(text) => return Ok(text),
				None => debug!("Attempt {} ended without a complete sentence", attempt),
			}
		}
		Err(ModelError::NoTerminator { attempts: self.config.max_attempts })
	}

	/// Runs one generation attempt.
	///
	/// Returns `Ok(None)` when no sentence terminator was reached; the caller
	/// must then try again rather than use a partial sentence.
	pub fn attempt<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Option<String>, ModelError> {
		let mut text = String::with_capacity(self.config.max_len + 16);
		let mut cut = 0;

		match self.walk(rng, &mut text, &mut cut)? {
			Walk::Bounded => (),
			Walk::DeadEnd => debug!("Dead end after {} bytes", text.len()),
		}

		if cut == 0 {
			return Ok(None);
		}
		text.truncate(cut);
		Ok(Some(text))
	}

	/// Extends `text` until the bound or a dead end, updating `cut` at every terminator.
	fn walk<R: Rng + ?Sized>(&self, rng: &mut R, text: &mut String, cut: &mut usize) -> Result<Walk, ModelError> {
		let mut key = self.tree.sample_key(rng)?;
		text.push_str(&capitalize(key));

		while text.len() < self.config.max_len {
			let Some(node) = self.tree.node(key) else {
				return Ok(Walk::DeadEnd);
			};

			let next = node.sample(rng)?;
			match TokenClass::of(next) {
				TokenClass::Terminator => {
					*cut = text.len() + 1;
					key = self.tree.sample_key(rng)?;
					text.push_str(next);
					text.push(' ');
					text.push_str(&capitalize(key));
				}
				TokenClass::Separator => {
					let word = match node.sample_word(rng) {
						Ok(word) => word,
						Err(e) if e.is_dead_end() => return Ok(Walk::DeadEnd),
						Err(e) => return Err(e),
					};
					text.push_str(next);
					text.push(' ');
					self.push_word(text, word);
					key = word;
				}
				TokenClass::Word => {
					text.push(' ');
					self.push_word(text, next);
					key = next;
				}
			}
		}

		Ok(Walk::Bounded)
	}

	/// Appends a word, capitalized if it is on the proper-noun list.
	fn push_word(&self, text: &mut String, word: &str) {
		if self.config.proper_nouns.contains(word) {
			text.push_str(&capitalize(word));
		} else {
			text.push_str(word);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::builder::ModelBuilder;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn tree(text: &str) -> Tree {
		let mut builder = ModelBuilder::new();
		builder.feed_str(text);
		builder.build()
	}

	#[test]
	fn test_empty_tree_is_rejected() {
		let tree = Tree::new();
		assert!(matches!(
			Generator::new(&tree, GeneratorConfig::default()),
			Err(ModelError::DegenerateTree)
		));
	}

	#[test]
	fn test_invalid_config_is_rejected() {
		let tree = tree("the cat sat.");
		let config = GeneratorConfig { max_len: 0, ..GeneratorConfig::default() };
		assert!(matches!(Generator::new(&tree, config), Err(ModelError::InvalidConfig(_))));
		let config = GeneratorConfig { max_attempts: 0, ..GeneratorConfig::default() };
		assert!(matches!(Generator::new(&tree, config), Err(ModelError::InvalidConfig(_))));
	}

	#[test]
	fn test_worked_example_output() {
		let tree = tree("the cat sat. the dog ran!");
		let generator = Generator::new(&tree, GeneratorConfig::default()).unwrap();
		let mut rng = StdRng::seed_from_u64(1);

		for _ in 0..200 {
			let text = generator.generate(&mut rng).unwrap();
			assert!(text.len() <= DEFAULT_MAX_LEN);
			assert!(text.ends_with('.') || text.ends_with('!'), "{text}");
			for sentence in text.split_inclusive(['.', '!']) {
				let sentence = sentence.trim_start();
				assert!(
					sentence == "The cat sat." || sentence == "The dog ran!"
						|| sentence == "Cat sat." || sentence == "Sat."
						|| sentence == "Dog ran!" || sentence == "Ran!",
					"unexpected sentence {sentence:?} in {text:?}"
				);
			}
		}
	}

	#[test]
	fn test_single_sentence_corpus_starts_with_the() {
		let tree = tree("the cat sat.");
		let generator = Generator::new(&tree, GeneratorConfig::default()).unwrap();
		let mut rng = StdRng::seed_from_u64(3);
		for _ in 0..50 {
			let text = generator.generate(&mut rng).unwrap();
			assert!(text.starts_with("The") || text.starts_with("Cat") || text.starts_with("Sat"));
			assert!(text.ends_with('.'));
		}
	}

	#[test]
	fn test_cut_lands_on_last_terminator() {
		let tree = tree("one two three four five six. seven eight nine ten!");
		let config = GeneratorConfig { max_len: 40, ..GeneratorConfig::default() };
		let generator = Generator::new(&tree, config).unwrap();
		let mut rng = StdRng::seed_from_u64(9);
		for _ in 0..200 {
			let text = generator.generate(&mut rng).unwrap();
			assert!(text.len() <= 40, "{text}");
			assert!(text.ends_with('.') || text.ends_with('!'), "{text}");
			assert!(!text.ends_with(' '));
		}
	}

	#[test]
	fn test_no_terminator_fails_after_bounded_retries() {
		let tree = tree("round and round and round and round");
		let config = GeneratorConfig { max_len: 60, max_attempts: 5, ..GeneratorConfig::default() };
		let generator = Generator::new(&tree, config).unwrap();
		let mut rng = StdRng::seed_from_u64(4);
		assert!(matches!(
			generator.generate(&mut rng),
			Err(ModelError::NoTerminator { attempts: 5 })
		));
	}

	#[test]
	fn test_attempt_without_terminator_is_none() {
		let tree = tree("round and round and round");
		let generator = Generator::new(&tree, GeneratorConfig::default()).unwrap();
		let mut rng = StdRng::seed_from_u64(4);
		assert_eq!(generator.attempt(&mut rng).unwrap(), None);
	}

	#[test]
	fn test_word_without_node_ends_attempt() {
		// "end" closes the corpus and never got a successor
		let tree = tree("the end");
		let generator = Generator::new(&tree, GeneratorConfig { max_attempts: 3, ..GeneratorConfig::default() }).unwrap();
		let mut rng = StdRng::seed_from_u64(2);
		assert_eq!(generator.attempt(&mut rng).unwrap(), None);
		assert!(matches!(
			generator.generate(&mut rng),
			Err(ModelError::NoTerminator { attempts: 3 })
		));
	}

	#[test]
	fn test_word_without_node_keeps_last_cut() {
		let tree = tree("the cat sat. the end");
		let config = GeneratorConfig { max_len: 120, ..GeneratorConfig::default() };
		let generator = Generator::new(&tree, config).unwrap();
		let mut rng = StdRng::seed_from_u64(31);
		for _ in 0..100 {
			let text = generator.generate(&mut rng).unwrap();
			assert!(text.len() <= 120, "{text}");
			assert!(text.ends_with('.'), "{text}");
			assert!(!text.to_ascii_lowercase().contains("end"), "{text}");
		}
	}

	#[test]
	fn test_separator_without_word_ends_attempt() {
		let tree = tree("then, ");
		let generator = Generator::new(&tree, GeneratorConfig { max_attempts: 3, ..GeneratorConfig::default() }).unwrap();
		let mut rng = StdRng::seed_from_u64(8);
		assert_eq!(generator.attempt(&mut rng).unwrap(), None);
		assert!(matches!(
			generator.generate(&mut rng),
			Err(ModelError::NoTerminator { attempts: 3 })
		));
	}

	#[test]
	fn test_separator_without_word_keeps_last_cut() {
		let tree = tree("go now. then, ");
		let generator = Generator::new(&tree, GeneratorConfig::default()).unwrap();
		let mut rng = StdRng::seed_from_u64(5);
		for _ in 0..100 {
			let text = generator.generate(&mut rng).unwrap();
			assert!(text.len() <= 280, "{text}");
			assert!(text.ends_with('.'), "{text}");
			assert!(!text.contains(','), "{text}");
		}
	}

	#[test]
	fn test_proper_nouns_are_capitalized() {
		let tree = tree("then i said. then zarathustra said.");
		let config = GeneratorConfig::default().with_proper_nouns(["i", "Zarathustra"]);
		let generator = Generator::new(&tree, config).unwrap();
		let mut rng = StdRng::seed_from_u64(12);
		for _ in 0..100 {
			let text = generator.generate(&mut rng).unwrap();
			assert!(!text.contains(" i "), "{text}");
			assert!(!text.contains(" zarathustra "), "{text}");
		}
	}

	#[test]
	fn test_separator_is_followed_by_a_word() {
		let tree = tree("yes, yes, yes, no. maybe, so.");
		let generator = Generator::new(&tree, GeneratorConfig::default()).unwrap();
		let mut rng = StdRng::seed_from_u64(21);
		for _ in 0..100 {
			let text = generator.generate(&mut rng).unwrap();
			for (i, _) in text.match_indices(", ") {
				let rest = &text[i + 2..];
				let first = rest.chars().next().unwrap();
				assert!(first.is_ascii_lowercase(), "{text}");
			}
			assert!(!text.ends_with(','));
		}
	}

	#[test]
	fn test_same_seed_same_text() {
		let tree = tree("the cat sat on the mat. the dog sat on the cat! did it?");
		let generator = Generator::new(&tree, GeneratorConfig::default()).unwrap();
		let first = generator.generate(&mut StdRng::seed_from_u64(77)).unwrap();
		let second = generator.generate(&mut StdRng::seed_from_u64(77)).unwrap();
		assert_eq!(first, second);
	}
}
