/// Characters that end a sentence.
pub const TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Characters that split a sentence into clauses.
pub const SEPARATORS: [char; 3] = [',', ';', ':'];

/// Kind of a token stored in the tree.
///
/// Words are lowercase ASCII runs; punctuation tokens are always a
/// single character from `TERMINATORS` or `SEPARATORS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
	Word,
	Terminator,
	Separator,
}

impl TokenClass {
	/// Classifies a single character, `None` for anything that is not punctuation we track.
	pub fn of_char(c: char) -> Option<Self> {
		if TERMINATORS.contains(&c) {
			Some(TokenClass::Terminator)
		} else if SEPARATORS.contains(&c) {
			Some(TokenClass::Separator)
		} else {
			None
		}
	}

	/// Classifies a token string.
	///
	/// Anything that is not exactly one tracked punctuation character is a word.
	pub fn of(token: &str) -> Self {
		let mut chars = token.chars();
		match (chars.next(), chars.next()) {
			(Some(c), None) => Self::of_char(c).unwrap_or(TokenClass::Word),
			_ => TokenClass::Word,
		}
	}

	pub fn is_punctuation(self) -> bool {
		self != TokenClass::Word
	}
}

/// Returns true if the token is a terminator or a separator.
pub fn is_punctuation(token: &str) -> bool {
	TokenClass::of(token).is_punctuation()
}

/// Uppercases the first character of a token.
///
/// Tokens are ASCII, so the byte length never changes.
pub fn capitalize(token: &str) -> String {
	let mut chars = token.chars();
	match chars.next() {
		Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
		None => String::new(),
	}
}
