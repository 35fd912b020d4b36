use std::borrow::Cow;
use std::fmt::Display;
use std::ops::Range;

use derive_more::Deref;
use derive_more::DerefMut;

use crate::TagFamily;
use crate::TagKind;
use crate::TransformError;
use crate::TransformResult;
use crate::lexer::parse_attributes;
use crate::markup::decode_entities;
use crate::patterns::TagMatch;

/// The ordered attribute list of a tag. Values are stored as written and
/// entity-decoded when read through [`Attributes::get`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
	/// The decoded value of the attribute `name`.
	pub fn get(&self, name: &str) -> Option<Cow<'_, str>> {
		self.raw(name).map(decode_entities)
	}

	/// The value of `name` exactly as it appears in the document.
	pub fn raw(&self, name: &str) -> Option<&str> {
		self.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}

	/// The decoded value of `name`, treating an empty value as absent.
	pub fn non_empty(&self, name: &str) -> Option<String> {
		self.get(name)
			.filter(|value| !value.is_empty())
			.map(Cow::into_owned)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.iter().any(|(key, _)| key == name)
	}

	/// Set `name`, replacing an existing value in place.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();
		let value = value.into();

		if let Some(slot) = self.iter_mut().find(|(key, _)| *key == name) {
			slot.1 = value;
		} else {
			self.push((name, value));
		}
	}
}

/// The ordering index of a token. Unordered tokens sort after every explicit
/// index; builtin template entries sort before everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenIndex {
	Builtin,
	Explicit(i64),
	Unordered,
}

impl Display for TokenIndex {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			TokenIndex::Builtin => write!(f, "-inf"),
			TokenIndex::Explicit(index) => write!(f, "{index}"),
			TokenIndex::Unordered => write!(f, "+inf"),
		}
	}
}

/// Position of a token in the document's token arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenIdx(pub(crate) usize);

impl TokenIdx {
	pub fn get(self) -> usize {
		self.0
	}
}

/// Data that only some families carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variant {
	/// A template definition, optionally replacing another template name.
	Template { overrides: Option<String> },
	/// A placeholder for the items that reference it. Nested anchors know the
	/// token whose value contains them.
	Anchor { parent: Option<TokenIdx> },
	/// Attaches itself to the token named by `reference`.
	Group { reference: Option<String> },
	/// A content unit, optionally pulled into the anchor named by `reference`.
	Item { reference: Option<String> },
	Plain,
}

impl Variant {
	pub fn family(&self) -> TagFamily {
		match self {
			Variant::Template { .. } => TagFamily::Template,
			Variant::Anchor { .. } => TagFamily::Anchor,
			Variant::Group { .. } => TagFamily::Group,
			Variant::Item { .. } => TagFamily::Item,
			Variant::Plain => TagFamily::Plain,
		}
	}

	/// The `ref` attribute of groups and items.
	pub fn reference(&self) -> Option<&str> {
		match self {
			Variant::Group { reference } | Variant::Item { reference } => reference.as_deref(),
			_ => None,
		}
	}
}

/// One matched tag span with its attributes resolved.
///
/// Every derived field is computed once when the token is created. The
/// engine owns all tokens of a document in an arena and tokens refer to each
/// other through [`TokenIdx`].
#[derive(Debug, Clone)]
pub struct Token {
	pub(crate) kind: usize,
	pub(crate) tag: String,
	/// Byte range in the document buffer, or in the parent's value for
	/// nested anchors.
	pub(crate) span: Range<usize>,
	pub(crate) attributes: Attributes,
	pub(crate) id: String,
	pub(crate) value: Option<String>,
	pub(crate) index: TokenIndex,
	pub(crate) template: Option<String>,
	pub(crate) selector: Option<String>,
	pub(crate) variant: Variant,
	pub(crate) anchors: Vec<TokenIdx>,
	pub(crate) managed: Vec<TokenIdx>,
	pub(crate) handled: bool,
	pub(crate) anchors_handled: bool,
}

impl Token {
	/// Resolve a matched span into a token of `kind`. `next_id` is called when
	/// the span has no usable `id` attribute.
	pub(crate) fn new(
		kind_index: usize,
		kind: &TagKind,
		found: &TagMatch<'_>,
		next_id: impl FnOnce() -> String,
	) -> TransformResult<Self> {
		let mut attributes = parse_attributes(found.tag, found.attrs)?;

		let id = if let Some(id) = attributes.non_empty("id") {
			id
		} else {
			let id = next_id();
			attributes.insert("id", id.clone());
			id
		};

		let index = match attributes.get("index") {
			Some(value) if !value.trim().is_empty() => {
				let parsed = value.trim().parse::<i64>().map_err(|_| {
					TransformError::InvalidIndex {
						tag: kind.name.clone(),
						id: id.clone(),
						value: value.to_string(),
					}
				})?;
				TokenIndex::Explicit(parsed)
			}
			_ => TokenIndex::Unordered,
		};

		let value = if kind.family.is_valuable() {
			found
				.value
				.filter(|value| !value.is_empty())
				.map(ToString::to_string)
				.or_else(|| attributes.non_empty("value"))
		} else {
			None
		};

		let reference = attributes.non_empty("ref");
		let variant = match kind.family {
			TagFamily::Template => {
				Variant::Template {
					overrides: attributes.non_empty("override"),
				}
			}
			TagFamily::Anchor => Variant::Anchor { parent: None },
			TagFamily::Group => Variant::Group { reference },
			TagFamily::Item => Variant::Item { reference },
			TagFamily::Plain => Variant::Plain,
		};

		Ok(Self {
			kind: kind_index,
			tag: kind.name.clone(),
			span: found.span.clone(),
			template: attributes
				.non_empty("tpl")
				.or_else(|| kind.template.clone().filter(|template| !template.is_empty())),
			selector: attributes.non_empty("selector"),
			attributes,
			id,
			value,
			index,
			variant,
			anchors: Vec::new(),
			managed: Vec::new(),
			handled: false,
			anchors_handled: false,
		})
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	/// The registered name of the token's kind.
	pub fn tag(&self) -> &str {
		&self.tag
	}

	pub fn family(&self) -> TagFamily {
		self.variant.family()
	}

	pub fn variant(&self) -> &Variant {
		&self.variant
	}

	pub fn span(&self) -> Range<usize> {
		self.span.clone()
	}

	pub fn attributes(&self) -> &Attributes {
		&self.attributes
	}

	pub fn value(&self) -> Option<&str> {
		self.value.as_deref()
	}

	pub fn index(&self) -> TokenIndex {
		self.index
	}

	/// The effective template name: the `tpl` attribute, or the default
	/// template of the token's kind.
	pub fn template(&self) -> Option<&str> {
		self.template.as_deref()
	}

	pub fn selector(&self) -> Option<&str> {
		self.selector.as_deref()
	}

	/// Anchors found inside this token's value, in document order.
	pub fn anchors(&self) -> &[TokenIdx] {
		&self.anchors
	}

	/// Tokens attached to this one by groups and anchors.
	pub fn managed(&self) -> &[TokenIdx] {
		&self.managed
	}

	pub fn is_handled(&self) -> bool {
		self.handled
	}

	pub fn is_nested(&self) -> bool {
		matches!(self.variant, Variant::Anchor { parent: Some(_) })
	}
}
