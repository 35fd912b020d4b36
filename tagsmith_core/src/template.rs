use std::collections::HashMap;

use crate::TransformError;
use crate::TransformResult;

/// The builtin template table.
pub const BUILTIN_TEMPLATES: [(&str, &str); 5] = [
	(
		"js",
		r#"<script type="text/javascript" src="{0}"></script>"#,
	),
	("script", r#"<script type="text/javascript">{0}</script>"#),
	(
		"cdata",
		"<script type=\"text/javascript\">\n\t//<![CDATA[\n\t\t{0}\n\t//]]>\n\t</script>",
	),
	(
		"css",
		r#"<link rel="stylesheet" type="text/css" href="{0}" />"#,
	),
	("style", r#"<style type="text/css">{0}</style>"#),
];

pub fn builtin_templates() -> HashMap<String, String> {
	BUILTIN_TEMPLATES
		.iter()
		.map(|(name, pattern)| ((*name).to_string(), (*pattern).to_string()))
		.collect()
}

/// A positional format string.
///
/// `{0}`, `{1}`, ... are replaced by the arguments at that position. `{{`
/// and `}}` produce literal braces, and any other brace is copied through,
/// so templates may contain CSS or script blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template<'a> {
	name: &'a str,
	pattern: &'a str,
}

impl<'a> Template<'a> {
	pub fn new(name: &'a str, pattern: &'a str) -> Self {
		Self { name, pattern }
	}

	/// An inline template is its own name.
	pub fn inline(pattern: &'a str) -> Self {
		Self::new(pattern, pattern)
	}

	pub fn name(&self) -> &'a str {
		self.name
	}

	pub fn pattern(&self) -> &'a str {
		self.pattern
	}

	pub fn apply(&self, args: &[&str]) -> TransformResult<String> {
		let pattern = self.pattern;
		let mut output = String::with_capacity(pattern.len());
		let mut rest = pattern;

		while let Some(position) = rest.find(['{', '}']) {
			output.push_str(&rest[..position]);
			let tail = &rest[position..];

			if tail.starts_with("{{") || tail.starts_with("}}") {
				output.push_str(&tail[..1]);
				rest = &tail[2..];
				continue;
			}

			if let Some((index, len)) = placeholder(tail) {
				let Some(arg) = args.get(index) else {
					return Err(TransformError::TemplateFormat {
						template: self.name.to_string(),
						reason: format!(
							"placeholder `{{{index}}}` has no argument ({} supplied)",
							args.len()
						),
					});
				};
				output.push_str(arg);
				rest = &tail[len..];
				continue;
			}

			output.push_str(&tail[..1]);
			rest = &tail[1..];
		}

		output.push_str(rest);
		Ok(output)
	}
}

/// Parse `{n}` at the start of `text`, returning the index and the length
/// of the placeholder.
fn placeholder(text: &str) -> Option<(usize, usize)> {
	let inner = text.strip_prefix('{')?;
	let end = inner.find('}')?;
	let digits = &inner[..end];

	if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}

	Some((digits.parse().ok()?, end + 2))
}
