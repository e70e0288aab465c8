use std::borrow::Cow;
use std::path::Path;

use log::{debug, info};

use super::token::TokenClass;
use super::tree::Tree;
use crate::error::ModelError;
use crate::io::read_corpus;

/// Byte window `[start, end)` of the corpus that is actually learned.
///
/// Used to cut front matter and afterwords out of a book.
/// `end = None` means "up to the end of the input".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CorpusRange {
	pub start: usize,
	pub end: Option<usize>,
}

impl CorpusRange {
	/// The whole input.
	pub fn full() -> Self {
		Self::default()
	}

	pub fn new(start: usize, end: Option<usize>) -> Self {
		Self { start, end }
	}

	/// Cuts the window out of `bytes` and decodes it.
	///
	/// A window boundary falling inside a multi-byte character is decoded
	/// lossily; the replacement character is a separator anyway.
	///
	/// # Errors
	/// Returns `InvalidRange` if `start > end` or `end` exceeds the input.
	pub fn slice<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>, ModelError> {
		let len = bytes.len();
		let end = self.end.unwrap_or(len);
		if self.start > end || end > len {
			return Err(ModelError::InvalidRange { start: self.start, end, len });
		}
		Ok(String::from_utf8_lossy(&bytes[self.start..end]))
	}
}

/// Streaming tokenizer that turns raw text into a `Tree`.
///
/// Words are runs of ASCII letters, lowercased. Every other character ends
/// the current run; when it is a terminator or a separator it is also
/// recorded as a successor of the word it follows.
///
/// # Behavior
/// - The first word of the input (or of a sentence) only opens the chain,
///   it gets no predecessor
/// - A sentence terminator clears the predecessor, sentences are not chained
/// - Consecutive non-letters collapse into a single boundary
/// - Text can be fed in several pieces; the result does not depend on the split
#[derive(Debug, Default)]
pub struct ModelBuilder {
	tree: Tree,
	/// Last completed word, empty at the start of input and of each sentence.
	previous: String,
	/// Letters accumulated since the last boundary.
	pending: String,
}

impl ModelBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a tree from a byte window of `bytes`.
	///
	/// # Errors
	/// Returns `InvalidRange` if the window does not fit.
	pub fn from_corpus(bytes: &[u8], range: CorpusRange) -> Result<Tree, ModelError> {
		let text = range.slice(bytes)?;
		let mut builder = Self::new();
		builder.feed_str(&text);
		Ok(builder.build())
	}

	/// Reads a corpus file and builds a tree from a byte window of it.
	///
	/// # Errors
	/// Returns an IO error if the file cannot be read, or `InvalidRange`.
	pub fn from_file<P: AsRef<Path>>(path: P, range: CorpusRange) -> Result<Tree, ModelError> {
		let bytes = read_corpus(&path)?;
		debug!("Read {} bytes from {}", bytes.len(), path.as_ref().display());
		Self::from_corpus(&bytes, range)
	}

	/// Feeds a piece of text to the tokenizer.
	pub fn feed_str(&mut self, text: &str) {
		for c in text.chars() {
			self.feed_char(c);
		}
	}

	fn feed_char(&mut self, c: char) {
		if c.is_ascii_alphabetic() {
			self.pending.push(c.to_ascii_lowercase());
		} else {
			self.end_word(Some(c));
		}
	}

	/// Closes the pending run at a boundary character.
	///
	/// `None` stands for end of input and behaves like whitespace.
	fn end_word(&mut self, boundary: Option<char>) {
		if self.pending.is_empty() {
			return;
		}

		let current = std::mem::take(&mut self.pending);
		self.tree.update(&self.previous, &current);

		let class = boundary.and_then(TokenClass::of_char);
		if let (Some(class), Some(c)) = (class, boundary) {
			let mut buf = [0u8; 4];
			self.tree.update(&current, c.encode_utf8(&mut buf));
			if class == TokenClass::Terminator {
				self.previous.clear();
				return;
			}
		}

		self.previous = current;
	}

	/// Flushes the last pending word and returns the finished tree.
	pub fn build(mut self) -> Tree {
		self.end_word(None);
		info!("Built tree: {} keys, {} transitions", self.tree.len(), self.tree.total());
		self.tree
	}
}
