use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Display;
use std::ops::Range;
use std::str::FromStr;

use regex::Captures;
use regex::Regex;
use regex::RegexBuilder;

use crate::TransformError;
use crate::TransformResult;
use crate::patterns::SELECTOR;
use crate::patterns::is_identifier;
use crate::patterns::is_integer;

/// Where output is spliced relative to the targeted text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Position {
	Before,
	#[default]
	After,
	Replace,
}

/// The capture group a selector operates on. Index `0` is the whole match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
	Index(usize),
	Name(String),
}

impl Default for CaptureTarget {
	fn default() -> Self {
		CaptureTarget::Index(0)
	}
}

/// Restricts which matches of a selector are eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pseudo {
	All,
	First,
	Last,
	Odd,
	Even,
	/// Every n-th match, counting from one.
	Nth(i64),
	Eq(i64),
	Gt(i64),
	Lt(i64),
}

impl Pseudo {
	fn parse(name: &str, arg: Option<&str>, selector: &str) -> TransformResult<Self> {
		let numeric = || -> TransformResult<i64> {
			let malformed = |reason: String| {
				TransformError::MalformedSelector {
					selector: selector.to_string(),
					reason,
				}
			};
			let arg = arg
				.map(str::trim)
				.filter(|arg| !arg.is_empty())
				.ok_or_else(|| malformed(format!("`{name}` requires a numeric argument")))?;

			if !is_integer(arg) {
				return Err(malformed(format!("`{name}({arg})` is not an integer")));
			}

			arg.parse::<i64>()
				.map_err(|e| malformed(format!("`{name}({arg})`: {e}")))
		};

		let pseudo = match name {
			"all" => Pseudo::All,
			"first" => Pseudo::First,
			"last" => Pseudo::Last,
			"odd" => Pseudo::Odd,
			"even" => Pseudo::Even,
			"nth" => {
				let n = numeric()?;
				if n == 0 {
					return Err(TransformError::MalformedSelector {
						selector: selector.to_string(),
						reason: "`nth(0)` never matches".to_string(),
					});
				}
				Pseudo::Nth(n)
			}
			"eq" => Pseudo::Eq(numeric()?),
			"gt" => Pseudo::Gt(numeric()?),
			"lt" => Pseudo::Lt(numeric()?),
			other => {
				return Err(TransformError::MalformedSelector {
					selector: selector.to_string(),
					reason: format!("unknown pseudo-filter `{other}`"),
				});
			}
		};

		Ok(pseudo)
	}

	/// Whether match `i` of `count` is included, and whether scanning stops
	/// after it.
	fn filter(self, i: usize, count: usize) -> (bool, bool) {
		let n = i as i64;
		match self {
			Pseudo::All => (true, false),
			Pseudo::First => (i == 0, i == 0),
			Pseudo::Last => (i + 1 == count, i + 1 == count),
			Pseudo::Odd => (i & 1 != 0, false),
			Pseudo::Even => (i & 1 == 0, false),
			Pseudo::Nth(step) => ((n + 1) % step == 0, false),
			Pseudo::Eq(target) => (n == target, n == target),
			Pseudo::Gt(target) => (n > target, false),
			Pseudo::Lt(target) => (n < target, n >= target),
		}
	}
}

/// A positional insertion rule.
///
/// The textual form is
/// `[before|after|replace][[group]][.pseudo[(n)]]:/pattern/flags`, where
/// every prefix part is optional and the `:` is only needed when a prefix
/// part is present. A bare pattern without slashes is accepted as well.
///
/// ```rust
/// use tagsmith_core::Position;
/// use tagsmith_core::Selector;
///
/// let selector: Selector = "before:/<\\/body>/i".parse().unwrap();
/// assert_eq!(selector.position(), Position::Before);
///
/// let mut buffer = String::from("<body></BODY>");
/// selector.place(&mut buffer, "<p>end</p>");
/// assert_eq!(buffer, "<body><p>end</p></BODY>");
/// ```
#[derive(Debug, Clone)]
pub struct Selector {
	source: String,
	pattern: Regex,
	target: CaptureTarget,
	pseudo: Option<Pseudo>,
	position: Position,
}

impl PartialEq for Selector {
	fn eq(&self, other: &Self) -> bool {
		self.source == other.source
	}
}

impl Eq for Selector {}

impl Selector {
	pub fn parse(source: &str) -> TransformResult<Self> {
		let malformed = |reason: &str| {
			TransformError::MalformedSelector {
				selector: source.to_string(),
				reason: reason.to_string(),
			}
		};

		let caps = SELECTOR
			.captures(trim_trailing_slash(source))
			.ok_or_else(|| malformed("does not follow the selector grammar"))?;

		let position = match caps.name("position").map(|m| m.as_str()) {
			Some("before") => Position::Before,
			Some("replace") => Position::Replace,
			_ => Position::After,
		};

		let (body, flags) = if let Some(pattern) = caps.name("pattern") {
			(
				pattern.as_str(),
				caps.name("flags").map_or("", |m| m.as_str()),
			)
		} else {
			(caps.name("bare").map_or("", |m| m.as_str()), "")
		};

		if body.is_empty() {
			return Err(malformed("the pattern is empty"));
		}

		let mut builder = RegexBuilder::new(body);
		for flag in flags.chars() {
			match flag {
				'i' => {
					builder.case_insensitive(true);
				}
				'm' => {
					builder.multi_line(true);
				}
				's' => {
					builder.dot_matches_new_line(true);
				}
				'w' => {
					builder.ignore_whitespace(true);
				}
				'r' => return Err(malformed("right-to-left matching (`r`) is not supported")),
				_ => {}
			}
		}

		let pattern = builder
			.build()
			.map_err(|e| malformed(&format!("invalid pattern: {e}")))?;

		let target = match caps.name("group").map(|m| m.as_str()) {
			None => CaptureTarget::default(),
			Some(group) if is_integer(group) => {
				let index = group
					.parse::<usize>()
					.map_err(|e| malformed(&format!("invalid group index: {e}")))?;
				if index >= pattern.captures_len() {
					return Err(malformed(&format!("the pattern has no capture group {index}")));
				}
				CaptureTarget::Index(index)
			}
			Some(group) => {
				if !pattern.capture_names().flatten().any(|name| name == group) {
					return Err(malformed(&format!("the pattern has no capture group `{group}`")));
				}
				CaptureTarget::Name(group.to_string())
			}
		};

		let pseudo = caps
			.name("pseudo")
			.map(|name| Pseudo::parse(name.as_str(), caps.name("arg").map(|m| m.as_str()), source))
			.transpose()?;

		Ok(Self {
			source: source.to_string(),
			pattern,
			target,
			pseudo,
			position,
		})
	}

	/// Resolve the `selector` attribute of a token. Bare identifiers name a
	/// predefined selector; everything else is parsed.
	pub fn resolve<'a>(
		source: &str,
		predefined: &'a HashMap<String, Selector>,
	) -> TransformResult<Cow<'a, Selector>> {
		if is_identifier(source) {
			return predefined
				.get(source)
				.map(Cow::Borrowed)
				.ok_or_else(|| TransformError::UnknownSelector(source.to_string()));
		}

		Self::parse(source).map(Cow::Owned)
	}

	pub fn as_str(&self) -> &str {
		&self.source
	}

	pub fn regex(&self) -> &Regex {
		&self.pattern
	}

	pub fn target(&self) -> &CaptureTarget {
		&self.target
	}

	pub fn pseudo(&self) -> Option<Pseudo> {
		self.pseudo
	}

	pub fn position(&self) -> Position {
		self.position
	}

	fn group<'h>(&self, caps: &Captures<'h>) -> Option<regex::Match<'h>> {
		match &self.target {
			CaptureTarget::Index(index) => caps.get(*index),
			CaptureTarget::Name(name) => caps.name(name),
		}
	}

	/// Byte ranges of the targeted group in every eligible match. Groups that
	/// did not participate in a match are skipped.
	fn eligible(&self, text: &str) -> Vec<Range<usize>> {
		let all: Vec<_> = self.pattern.captures_iter(text).collect();
		let count = all.len();
		let mut ranges = Vec::new();

		for (i, caps) in all.iter().enumerate() {
			let (include, stop) = match self.pseudo {
				Some(pseudo) => pseudo.filter(i, count),
				None => (true, true),
			};

			if include {
				if let Some(group) = self.group(caps) {
					ranges.push(group.range());
				}
			}

			if stop {
				break;
			}
		}

		ranges
	}

	/// The targeted text of every eligible match, in order.
	pub fn matches<'h>(&self, text: &'h str) -> Vec<&'h str> {
		self.eligible(text)
			.into_iter()
			.map(|range| &text[range])
			.collect()
	}

	/// Splice `output` into `buffer` at every eligible match and return the
	/// number of placements. Matches are found before the buffer is touched;
	/// a running offset shifts later matches by the length change of earlier
	/// splices.
	pub fn place(&self, buffer: &mut String, output: &str) -> usize {
		let ranges = self.eligible(buffer);
		let mut offset: isize = 0;

		for range in &ranges {
			let start = shift(range.start, offset);
			let end = shift(range.end, offset);

			match self.position {
				Position::Before => buffer.insert_str(start, output),
				Position::After => buffer.insert_str(end, output),
				Position::Replace => buffer.replace_range(start..end, output),
			}

			let removed = if self.position == Position::Replace {
				range.len()
			} else {
				0
			};
			offset += output.len() as isize - removed as isize;
		}

		ranges.len()
	}
}

fn shift(position: usize, offset: isize) -> usize {
	position.saturating_add_signed(offset)
}

/// Strip one trailing `/` unless it is escaped.
fn trim_trailing_slash(pattern: &str) -> &str {
	match pattern.strip_suffix('/') {
		Some(trimmed) if !trimmed.ends_with('\\') => trimmed,
		_ => pattern,
	}
}

impl FromStr for Selector {
	type Err = TransformError;

	fn from_str(source: &str) -> Result<Self, Self::Err> {
		Self::parse(source)
	}
}

impl Display for Selector {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.source)
	}
}
