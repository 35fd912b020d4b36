use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::Patterns;
use crate::Selector;
use crate::TagFamily;
use crate::TagKind;
use crate::TagPattern;
use crate::TagRegistry;
use crate::TransformError;
use crate::TransformResult;
use crate::VariablePattern;
use crate::builtin_templates;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"tagsmith.toml",
	".tagsmith.toml",
	".config/tagsmith.toml",
];

/// Variable name to value mapping used for `<#:name />` placeholders.
pub type Variables = HashMap<String, String>;

/// Everything a [`Transformer`](crate::Transformer) needs besides the
/// document.
#[derive(Debug, Clone)]
pub struct TransformerConfig {
	pub patterns: Patterns,
	/// Tag kinds, starting with the standard four.
	pub kinds: TagRegistry,
	/// Predefined selectors, looked up when a `selector` attribute is a bare
	/// name.
	pub selectors: HashMap<String, Selector>,
	/// Builtin template table. Seeded with `js`, `script`, `cdata`, `css` and
	/// `style`.
	pub templates: HashMap<String, String>,
	/// When set, variable placeholders are substituted before tokenizing. An
	/// empty mapping still makes every placeholder an error.
	pub variables: Option<Variables>,
	pub skip_validation: bool,
	/// Prefix for generated token ids. Defaults to `_tkn_`.
	pub id_prefix: Option<String>,
}

impl Default for TransformerConfig {
	fn default() -> Self {
		Self {
			patterns: Patterns::default(),
			kinds: TagRegistry::standard(),
			selectors: HashMap::new(),
			templates: builtin_templates(),
			variables: None,
			skip_validation: false,
			id_prefix: None,
		}
	}
}

impl TransformerConfig {
	/// The configuration used for HTML documents: the standard kinds plus
	/// `js`, `css`, `script` and `style`, and the `headstart`, `headend`,
	/// `bodystart` and `bodyend` selectors.
	pub fn html() -> Self {
		crate::html::config()
	}

	#[must_use]
	pub fn with_patterns(mut self, patterns: Patterns) -> Self {
		self.patterns = patterns;
		self
	}

	#[must_use]
	pub fn with_tag_pattern(mut self, pattern: TagPattern) -> Self {
		self.patterns.tag = pattern;
		self
	}

	#[must_use]
	pub fn with_anchor_pattern(mut self, pattern: TagPattern) -> Self {
		self.patterns.anchor = pattern;
		self
	}

	#[must_use]
	pub fn with_variable_pattern(mut self, pattern: VariablePattern) -> Self {
		self.patterns.variable = pattern;
		self
	}

	#[must_use]
	pub fn with_kind(mut self, kind: TagKind) -> Self {
		self.kinds.register(kind);
		self
	}

	/// Replace the whole kind table.
	#[must_use]
	pub fn with_registry(mut self, kinds: TagRegistry) -> Self {
		self.kinds = kinds;
		self
	}

	#[must_use]
	pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = TagKind>) -> Self {
		self.kinds.extend(kinds);
		self
	}

	#[must_use]
	pub fn with_selector(mut self, name: impl Into<String>, selector: Selector) -> Self {
		self.selectors.insert(name.into(), selector);
		self
	}

	#[must_use]
	pub fn with_template(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
		self.templates.insert(name.into(), pattern.into());
		self
	}

	#[must_use]
	pub fn with_variables(mut self, variables: Variables) -> Self {
		self.variables = Some(variables);
		self
	}

	/// Add one variable, creating the mapping if needed.
	#[must_use]
	pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.variables
			.get_or_insert_with(Variables::new)
			.insert(name.into(), value.into());
		self
	}

	#[must_use]
	pub fn with_skip_validation(mut self, skip: bool) -> Self {
		self.skip_validation = skip;
		self
	}

	#[must_use]
	pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.id_prefix = Some(prefix.into());
		self
	}
}

/// The document flavor a config file starts from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
	#[default]
	Text,
	Html,
}

/// A tag pattern override: the opening regex and the literal closing tag.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TagPatternConfig {
	pub open: String,
	pub closing: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PatternsConfig {
	#[serde(default)]
	pub tag: Option<TagPatternConfig>,
	#[serde(default)]
	pub variable: Option<String>,
	#[serde(default)]
	pub anchor: Option<TagPatternConfig>,
}

/// A `[[kinds]]` entry.
///
/// ```toml
/// [[kinds]]
/// name = "note"
/// family = "item"
/// template = "<aside>{0}</aside>"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct KindConfig {
	pub name: String,
	pub family: TagFamily,
	#[serde(default)]
	pub template: Option<String>,
	#[serde(default)]
	pub argument: Option<String>,
}

impl From<KindConfig> for TagKind {
	fn from(config: KindConfig) -> Self {
		TagKind {
			name: config.name,
			family: config.family,
			template: config.template,
			argument: config.argument,
		}
	}
}

/// Configuration loaded from `tagsmith.toml`.
///
/// ```toml
/// flavor = "html"
/// skip_validation = false
///
/// [variables]
/// title = "Home"
///
/// [templates]
/// quote = "<blockquote>{0}</blockquote>"
///
/// [selectors]
/// footer = "before:/<\\/footer>/i"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TagsmithConfig {
	#[serde(default)]
	pub flavor: Flavor,
	#[serde(default)]
	pub skip_validation: bool,
	#[serde(default)]
	pub id_prefix: Option<String>,
	/// Present only when the file has a `[variables]` table.
	#[serde(default)]
	pub variables: Option<BTreeMap<String, String>>,
	#[serde(default)]
	pub templates: BTreeMap<String, String>,
	#[serde(default)]
	pub selectors: BTreeMap<String, String>,
	#[serde(default)]
	pub patterns: PatternsConfig,
	#[serde(default)]
	pub kinds: Vec<KindConfig>,
}

impl TagsmithConfig {
	/// Returns the first existing config file path in discovery order.
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first candidate file under `root`. Returns
	/// `None` when there is no config file.
	pub fn load(root: &Path) -> TransformResult<Option<TagsmithConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		tracing::debug!(path = %config_path.display(), "loading config");
		let content = std::fs::read_to_string(&config_path)?;

		content.parse().map(Some)
	}

	/// Build the engine configuration, compiling every pattern and selector.
	pub fn into_transformer_config(self) -> TransformResult<TransformerConfig> {
		let mut config = match self.flavor {
			Flavor::Text => TransformerConfig::default(),
			Flavor::Html => TransformerConfig::html(),
		};

		if let Some(tag) = self.patterns.tag {
			config.patterns.tag = TagPattern::new(&tag.open, tag.closing)?;
		}

		if let Some(anchor) = self.patterns.anchor {
			config.patterns.anchor = TagPattern::new(&anchor.open, anchor.closing)?;
		}

		if let Some(variable) = self.patterns.variable {
			config.patterns.variable = VariablePattern::new(&variable)?;
		}

		config.kinds.extend(self.kinds.into_iter().map(TagKind::from));
		config.templates.extend(self.templates);

		for (name, source) in self.selectors {
			config.selectors.insert(name, Selector::parse(&source)?);
		}

		config.variables = self.variables.map(|variables| variables.into_iter().collect());
		config.skip_validation = self.skip_validation;
		config.id_prefix = self.id_prefix;

		Ok(config)
	}
}

impl std::str::FromStr for TagsmithConfig {
	type Err = TransformError;

	fn from_str(content: &str) -> Result<Self, Self::Err> {
		toml::from_str(content).map_err(|e| TransformError::ConfigParse(e.to_string()))
	}
}
