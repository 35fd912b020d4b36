use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::TransformError;
use crate::TransformResult;

/// Opening part of a tag span. The attribute text may contain quoted values
/// with `>` inside them; an unquoted `>` always ends the opening tag.
pub const DEFAULT_TAG_OPEN: &str = r#"<#:(?P<tag>\w+)(?P<attrs>(?:\s(?:[^"'>]|"[^"]*"|'[^']*')*?)?)\s*(?P<selfclosing>/)?>"#;
/// Closing tag of a paired span. `{tag}` is replaced with the opening tag
/// name.
pub const DEFAULT_TAG_CLOSING: &str = "</#:{tag}>";
pub const DEFAULT_ANCHOR_OPEN: &str = r#"<#:(?P<tag>anchor)(?P<attrs>(?:\s(?:[^"'>]|"[^"]*"|'[^']*')*?)?)\s*(?P<selfclosing>/)?>"#;
pub const DEFAULT_ANCHOR_CLOSING: &str = "</#:anchor>";
/// `<#:name />` or `<#:tag:func />`.
pub const DEFAULT_VARIABLE: &str = r"<#:(?P<tag>\w+)(?::(?P<func>\w+))?\s+#?/>";

/// Grammar of an inline selector. See [`crate::Selector`].
const SELECTOR_GRAMMAR: &str = r"(?s)^(?:(?P<position>before|after|replace)?(?:\[(?P<group>\w+)\])?(?:\.?(?:(?P<pseudo>all|first|last|odd|even|nth|eq|gt|lt)(?:\((?P<arg>[^)]*)\))?)?)?:)?(?:/?(?:(?:(?P<pattern>.+)/(?P<flags>[imxswrec]+))|(?P<bare>.+)))$";

static TAG_PATTERN: LazyLock<TagPattern> = LazyLock::new(|| {
	TagPattern::compile(DEFAULT_TAG_OPEN, DEFAULT_TAG_CLOSING)
});
static ANCHOR_PATTERN: LazyLock<TagPattern> = LazyLock::new(|| {
	TagPattern::compile(DEFAULT_ANCHOR_OPEN, DEFAULT_ANCHOR_CLOSING)
});
static VARIABLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| compile(DEFAULT_VARIABLE));
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| compile(r"^\w*$"));
static INTEGER: LazyLock<Regex> = LazyLock::new(|| compile(r"^-?\d+$"));
pub(crate) static SELECTOR: LazyLock<Regex> = LazyLock::new(|| compile(SELECTOR_GRAMMAR));

fn compile(pattern: &str) -> Regex {
	Regex::new(pattern).expect("builtin pattern must compile")
}

/// Returns true when `value` consists only of word characters. Template and
/// selector names that pass this check are lookup keys, everything else is an
/// inline definition.
pub fn is_identifier(value: &str) -> bool {
	IDENTIFIER.is_match(value)
}

pub(crate) fn is_integer(value: &str) -> bool {
	INTEGER.is_match(value)
}

/// A tag span pattern: a regex for the opening tag plus the literal closing
/// tag used to find the end of a paired span.
///
/// The opening regex must define the named groups `tag`, `attrs` and
/// `selfclosing`. When `selfclosing` participates in a match the span ends
/// with the opening tag. Otherwise the span runs to the first closing tag
/// with the same name, and a span with no matching closing tag does not match
/// at all.
#[derive(Debug, Clone)]
pub struct TagPattern {
	open: Regex,
	closing: String,
}

impl Default for TagPattern {
	fn default() -> Self {
		TAG_PATTERN.clone()
	}
}

impl TagPattern {
	/// Build a tag pattern from user supplied parts.
	pub fn new(open: &str, closing: impl Into<String>) -> TransformResult<Self> {
		let regex = Regex::new(open).map_err(|e| {
			TransformError::InvalidPattern {
				name: "tag",
				reason: e.to_string(),
			}
		})?;

		for group in ["tag", "attrs", "selfclosing"] {
			if !regex.capture_names().flatten().any(|name| name == group) {
				return Err(TransformError::InvalidPattern {
					name: "tag",
					reason: format!("missing named capture group `{group}`"),
				});
			}
		}

		Ok(Self {
			open: regex,
			closing: closing.into(),
		})
	}

	fn compile(open: &str, closing: &str) -> Self {
		Self {
			open: compile(open),
			closing: closing.to_string(),
		}
	}

	/// The builtin pattern for nested anchors.
	pub fn anchor() -> Self {
		ANCHOR_PATTERN.clone()
	}

	pub fn as_str(&self) -> &str {
		self.open.as_str()
	}

	pub fn closing(&self) -> &str {
		&self.closing
	}

	/// Iterate over all non-overlapping tag spans in `haystack`.
	pub fn find_iter<'p, 'h>(&'p self, haystack: &'h str) -> TagMatches<'p, 'h> {
		TagMatches {
			pattern: self,
			haystack,
			at: 0,
		}
	}
}

/// One tag span found by a [`TagPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatch<'h> {
	/// The tag name, e.g. `item`.
	pub tag: &'h str,
	/// The raw attribute text of the opening tag.
	pub attrs: &'h str,
	/// The inner text of a paired span. `None` for self-closing spans.
	pub value: Option<&'h str>,
	/// Byte range of the whole span.
	pub span: Range<usize>,
	/// Byte range of the inner text.
	pub value_span: Option<Range<usize>>,
}

pub struct TagMatches<'p, 'h> {
	pattern: &'p TagPattern,
	haystack: &'h str,
	at: usize,
}

impl<'h> Iterator for TagMatches<'_, 'h> {
	type Item = TagMatch<'h>;

	fn next(&mut self) -> Option<Self::Item> {
		while self.at <= self.haystack.len() {
			let caps = self.pattern.open.captures_at(self.haystack, self.at)?;
			let whole = caps.get(0)?;
			let tag = caps.name("tag").map_or("", |m| m.as_str());
			let attrs = caps.name("attrs").map_or("", |m| m.as_str().trim());

			if whole.is_empty() || tag.is_empty() {
				self.at = next_boundary(self.haystack, whole.start());
				continue;
			}

			if caps.name("selfclosing").is_some() {
				self.at = whole.end();
				return Some(TagMatch {
					tag,
					attrs,
					value: None,
					span: whole.range(),
					value_span: None,
				});
			}

			let closing = self.pattern.closing.replace("{tag}", tag);
			let Some(offset) = self.haystack[whole.end()..].find(&closing) else {
				// An opening tag without its closing tag is not a span.
				self.at = next_boundary(self.haystack, whole.start());
				continue;
			};

			let value_span = whole.end()..whole.end() + offset;
			let end = value_span.end + closing.len();
			self.at = end;

			return Some(TagMatch {
				tag,
				attrs,
				value: Some(&self.haystack[value_span.clone()]),
				span: whole.start()..end,
				value_span: Some(value_span),
			});
		}

		None
	}
}

fn next_boundary(haystack: &str, from: usize) -> usize {
	haystack[from..]
		.chars()
		.next()
		.map_or(haystack.len() + 1, |ch| from + ch.len_utf8())
}

/// Variable placeholder pattern. Must define the named group `tag`; the
/// optional `func` group takes precedence as the lookup key when it
/// participates.
#[derive(Debug, Clone)]
pub struct VariablePattern(Regex);

impl Default for VariablePattern {
	fn default() -> Self {
		Self(VARIABLE_PATTERN.clone())
	}
}

impl VariablePattern {
	pub fn new(pattern: &str) -> TransformResult<Self> {
		let regex = Regex::new(pattern).map_err(|e| {
			TransformError::InvalidPattern {
				name: "variable",
				reason: e.to_string(),
			}
		})?;

		if !regex.capture_names().flatten().any(|name| name == "tag") {
			return Err(TransformError::InvalidPattern {
				name: "variable",
				reason: "missing named capture group `tag`".to_string(),
			});
		}

		Ok(Self(regex))
	}

	pub fn regex(&self) -> &Regex {
		&self.0
	}
}

/// The configurable pattern set used by one transformer.
#[derive(Debug, Clone)]
pub struct Patterns {
	/// Primary tag span pattern.
	pub tag: TagPattern,
	/// Variable placeholder pattern.
	pub variable: VariablePattern,
	/// Pattern for anchors nested in another token's value.
	pub anchor: TagPattern,
}

impl Default for Patterns {
	fn default() -> Self {
		Self {
			tag: TagPattern::default(),
			variable: VariablePattern::default(),
			anchor: TagPattern::anchor(),
		}
	}
}
