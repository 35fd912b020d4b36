use std::fmt::Display;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// The behavior family a tag kind belongs to. The engine dispatches the
/// begin and end callbacks, validation and output composition on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagFamily {
	/// Named, reusable format strings (`<#:tpl>`).
	Template,
	/// Placeholders resolving to the items that reference them.
	Anchor,
	/// Tokens attaching themselves to another token.
	Group,
	/// Content units.
	Item,
	/// Consumer kinds without any cross-token behavior.
	Plain,
}

impl TagFamily {
	/// Anchors and groups never carry a value.
	pub fn is_valuable(self) -> bool {
		!matches!(self, TagFamily::Anchor | TagFamily::Group)
	}
}

impl Display for TagFamily {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			TagFamily::Template => "template",
			TagFamily::Anchor => "anchor",
			TagFamily::Group => "group",
			TagFamily::Item => "item",
			TagFamily::Plain => "plain",
		};
		write!(f, "{name}")
	}
}

impl FromStr for TagFamily {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value {
			"template" | "tpl" => Ok(TagFamily::Template),
			"anchor" => Ok(TagFamily::Anchor),
			"group" => Ok(TagFamily::Group),
			"item" => Ok(TagFamily::Item),
			"plain" => Ok(TagFamily::Plain),
			_ => Err(format!("unknown tag family `{value}`")),
		}
	}
}

/// A registered tag name and the rule used to instantiate its tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagKind {
	pub name: String,
	pub family: TagFamily,
	/// Template used when a token has no `tpl` attribute.
	pub template: Option<String>,
	/// Attribute whose value the template is applied to, instead of the
	/// token's content. The HTML `js` and `css` kinds use `path`.
	pub argument: Option<String>,
}

impl TagKind {
	pub fn new(name: impl Into<String>, family: TagFamily) -> Self {
		Self {
			name: name.into(),
			family,
			template: None,
			argument: None,
		}
	}

	pub fn item(name: impl Into<String>) -> Self {
		Self::new(name, TagFamily::Item)
	}

	pub fn plain(name: impl Into<String>) -> Self {
		Self::new(name, TagFamily::Plain)
	}

	#[must_use]
	pub fn with_template(mut self, template: impl Into<String>) -> Self {
		self.template = Some(template.into());
		self
	}

	#[must_use]
	pub fn with_argument(mut self, attribute: impl Into<String>) -> Self {
		self.argument = Some(attribute.into());
		self
	}
}

/// Ordered tag kind table. Registration order is also the order in which
/// the engine runs group callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRegistry {
	kinds: Vec<TagKind>,
}

impl Default for TagRegistry {
	fn default() -> Self {
		Self::standard()
	}
}

impl TagRegistry {
	/// A registry with no kinds at all.
	pub fn empty() -> Self {
		Self { kinds: Vec::new() }
	}

	/// A registry holding exactly `kinds`, in order.
	pub fn from_kinds(kinds: impl IntoIterator<Item = TagKind>) -> Self {
		let mut registry = Self::empty();
		registry.extend(kinds);
		registry
	}

	/// The four standard kinds: `tpl`, `anchor`, `group` and `item`.
	pub fn standard() -> Self {
		Self {
			kinds: vec![
				TagKind::new("tpl", TagFamily::Template),
				TagKind::new("anchor", TagFamily::Anchor),
				TagKind::new("group", TagFamily::Group),
				TagKind::new("item", TagFamily::Item),
			],
		}
	}

	/// Register a kind. Registering an existing name replaces its rule but
	/// keeps its position.
	pub fn register(&mut self, kind: TagKind) {
		if let Some(existing) = self.kinds.iter_mut().find(|k| k.name == kind.name) {
			tracing::debug!(name = %kind.name, "replacing registered tag kind");
			*existing = kind;
		} else {
			self.kinds.push(kind);
		}
	}

	#[must_use]
	pub fn with(mut self, kind: TagKind) -> Self {
		self.register(kind);
		self
	}

	pub fn extend(&mut self, kinds: impl IntoIterator<Item = TagKind>) {
		for kind in kinds {
			self.register(kind);
		}
	}

	/// Position and rule of the kind registered as `name`.
	pub fn resolve(&self, name: &str) -> Option<(usize, &TagKind)> {
		self.kinds.iter().enumerate().find(|(_, kind)| kind.name == name)
	}

	pub fn get(&self, position: usize) -> Option<&TagKind> {
		self.kinds.get(position)
	}

	/// The kind nested anchors are instantiated as: the first registered
	/// anchor-family kind.
	pub fn anchor_kind(&self) -> Option<(usize, &TagKind)> {
		self.kinds
			.iter()
			.enumerate()
			.find(|(_, kind)| kind.family == TagFamily::Anchor)
	}

	pub fn iter(&self) -> impl Iterator<Item = &TagKind> {
		self.kinds.iter()
	}

	pub fn len(&self) -> usize {
		self.kinds.len()
	}

	pub fn is_empty(&self) -> bool {
		self.kinds.is_empty()
	}
}

impl FromIterator<TagKind> for TagRegistry {
	/// Builds the standard registry extended with `iter`.
	fn from_iter<T: IntoIterator<Item = TagKind>>(iter: T) -> Self {
		let mut registry = Self::standard();
		registry.extend(iter);
		registry
	}
}
