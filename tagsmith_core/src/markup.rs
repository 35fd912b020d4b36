//! Small helpers for the tag wire format: entity decoding of attribute
//! values and rendering tags back to text.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"&(?:#(?P<dec>[0-9]{1,7})|#[xX](?P<hex>[0-9a-fA-F]{1,6})|(?P<name>amp|lt|gt|quot|apos));")
		.expect("entity pattern must compile")
});

/// Decode the entities an attribute value may carry: `&amp;`, `&lt;`,
/// `&gt;`, `&quot;`, `&apos;` and semicolon-terminated numeric references.
/// Unknown or malformed entities and invalid scalar values pass through
/// unchanged.
pub fn decode_entities(value: &str) -> Cow<'_, str> {
	if !value.contains('&') {
		return Cow::Borrowed(value);
	}

	ENTITY.replace_all(value, |caps: &Captures<'_>| {
		let decoded = if let Some(name) = caps.name("name") {
			match name.as_str() {
				"amp" => Some('&'),
				"lt" => Some('<'),
				"gt" => Some('>'),
				"quot" => Some('"'),
				_ => Some('\''),
			}
		} else if let Some(dec) = caps.name("dec") {
			dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
		} else {
			caps.name("hex")
				.and_then(|hex| u32::from_str_radix(hex.as_str(), 16).ok())
				.and_then(char::from_u32)
		};

		decoded.map_or_else(|| caps[0].to_string(), String::from)
	})
}

/// Escape a value for use inside a double quoted attribute.
pub fn encode_attribute(value: &str) -> Cow<'_, str> {
	if !value.contains(['&', '"']) {
		return Cow::Borrowed(value);
	}

	Cow::Owned(value.replace('&', "&amp;").replace('"', "&quot;"))
}

/// Render a tag in the document syntax. Tags with an empty value are
/// self-closing.
///
/// ```rust
/// use tagsmith_core::markup::create_tag;
///
/// let tag = create_tag("item", [("id", "x1"), ("ref", "a1")], "Hello");
/// assert_eq!(tag, r#"<#:item id="x1" ref="a1">Hello</#:item>"#);
///
/// let tag = create_tag("anchor", [("id", "a1")], "");
/// assert_eq!(tag, r#"<#:anchor id="a1" />"#);
/// ```
pub fn create_tag<'a, I>(name: &str, attributes: I, value: &str) -> String
where
	I: IntoIterator<Item = (&'a str, &'a str)>,
{
	let mut tag = format!("<#:{name}");

	for (key, attribute) in attributes {
		tag.push_str(&format!(" {key}=\"{}\"", encode_attribute(attribute)));
	}

	if value.is_empty() {
		tag.push_str(" />");
	} else {
		tag.push_str(&format!(">{value}</#:{name}>"));
	}

	tag
}
