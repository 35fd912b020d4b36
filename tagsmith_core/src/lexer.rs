use logos::Logos;

use crate::TransformError;
use crate::TransformResult;
use crate::tokens::Attributes;

/// Raw tokens produced by logos for the attribute text of an opening tag.
#[derive(Logos, Debug, PartialEq, Clone, Copy)]
enum RawToken {
	#[token("=")]
	Equals,
	#[regex(r"[ \t\r\n\f]+")]
	Whitespace,
	#[regex(r#""[^"]*""#)]
	DoubleQuotedString,
	#[regex(r"'[^']*'")]
	SingleQuotedString,
	#[regex(r#"[^"'<>= \t\r\n\f]+"#)]
	Word,
}

/// Walks the logos token stream and collects `name=value` pairs. Anything
/// that is not part of a well-formed pair is skipped, the same way a
/// pattern scan would skip it.
struct AttributeWalker<'a> {
	/// The tag whose attributes are being read, for error reporting.
	tag: &'a str,
	/// The attribute text of the tag.
	source: &'a str,
	/// The collected raw tokens and their byte spans.
	raw_tokens: Vec<(Result<RawToken, ()>, std::ops::Range<usize>)>,
	/// Current index into `raw_tokens`.
	cursor: usize,
	attributes: Attributes,
}

impl<'a> AttributeWalker<'a> {
	fn new(tag: &'a str, source: &'a str) -> Self {
		let raw_tokens: Vec<_> = RawToken::lexer(source).spanned().collect();

		Self {
			tag,
			source,
			raw_tokens,
			cursor: 0,
			attributes: Attributes::default(),
		}
	}

	fn peek(&self) -> Option<RawToken> {
		self.raw_tokens
			.get(self.cursor)
			.and_then(|(result, _)| result.ok())
	}

	fn slice(&self) -> &'a str {
		let (_, span) = &self.raw_tokens[self.cursor];
		&self.source[span.clone()]
	}

	fn skip_whitespace(&mut self) {
		while self.peek() == Some(RawToken::Whitespace) {
			self.cursor += 1;
		}
	}

	/// Read the value after `=`. Returns `None` and leaves the cursor in
	/// place when there is no value.
	fn read_value(&mut self) -> Option<String> {
		match self.peek()? {
			RawToken::DoubleQuotedString | RawToken::SingleQuotedString => {
				let slice = self.slice();
				self.cursor += 1;
				Some(slice[1..slice.len() - 1].to_string())
			}
			// Bare values run until whitespace or a quote, so `a=b=c` reads
			// `b=c`.
			RawToken::Word | RawToken::Equals => {
				let mut value = String::new();
				while let Some(RawToken::Word | RawToken::Equals) = self.peek() {
					value.push_str(self.slice());
					self.cursor += 1;
				}
				Some(value)
			}
			RawToken::Whitespace => None,
		}
	}

	fn process(mut self) -> TransformResult<Attributes> {
		while self.cursor < self.raw_tokens.len() {
			if self.peek() != Some(RawToken::Word) {
				self.cursor += 1;
				continue;
			}

			let name = attribute_name(self.slice());
			self.cursor += 1;
			self.skip_whitespace();

			if self.peek() != Some(RawToken::Equals) {
				continue;
			}

			self.cursor += 1;
			self.skip_whitespace();

			let Some(value) = self.read_value() else {
				continue;
			};

			if name.is_empty() {
				continue;
			}

			if self.attributes.contains(name) {
				return Err(TransformError::DuplicateAttribute {
					tag: self.tag.to_string(),
					name: name.to_string(),
				});
			}

			self.attributes.insert(name, value);
		}

		Ok(self.attributes)
	}
}

/// The attribute name is the trailing run of word characters, so `data-id`
/// yields `id`.
fn attribute_name(word: &str) -> &str {
	let start = word
		.char_indices()
		.rev()
		.find(|(_, ch)| !(ch.is_alphanumeric() || *ch == '_'))
		.map_or(0, |(index, ch)| index + ch.len_utf8());

	&word[start..]
}

/// Parse the attribute text of a `tag` into an ordered attribute list.
pub fn parse_attributes(tag: &str, source: &str) -> TransformResult<Attributes> {
	if source.trim().is_empty() {
		return Ok(Attributes::default());
	}

	AttributeWalker::new(tag, source).process()
}
