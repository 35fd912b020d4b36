//! The HTML flavor: wrapper tags for scripts and stylesheets and the
//! predefined insertion points of an HTML page.
//!
//! ```rust
//! let page = "<html><head><title>t</title></head><body>\
//!             <#:js path=\"app.js\" selector=\"headend\" /></body></html>";
//!
//! let output = tagsmith_core::html::transform(page).unwrap();
//! assert_eq!(
//! 	output,
//! 	"<html><head><title>t</title><script type=\"text/javascript\" \
//! 	 src=\"app.js\"></script></head><body></body></html>"
//! );
//! ```

use crate::Selector;
use crate::TagKind;
use crate::TagRegistry;
use crate::TransformResult;
use crate::Transformer;
use crate::TransformerConfig;
use crate::Variables;

/// `(name, selector)` pairs for the predefined insertion points.
pub const SELECTORS: [(&str, &str); 4] = [
	("headstart", r"after:/<head(?:\s[^>]*)?>/is"),
	("headend", r"before:/<\/head\s*>/i"),
	("bodystart", r"after:/<body(?:\s[^>]*)?>/is"),
	("bodyend", r"before:/<\/body\s*>/i"),
];

/// The HTML tag kinds. `js` and `css` apply their template to the `path`
/// attribute; `script` and `style` wrap their content.
pub fn kinds() -> [TagKind; 4] {
	[
		TagKind::item("js")
			.with_template("js")
			.with_argument("path"),
		TagKind::item("css")
			.with_template("css")
			.with_argument("path"),
		TagKind::item("script").with_template("script"),
		TagKind::item("style").with_template("style"),
	]
}

pub fn selectors() -> TransformResult<Vec<(String, Selector)>> {
	SELECTORS
		.iter()
		.map(|(name, source)| Ok(((*name).to_string(), Selector::parse(source)?)))
		.collect()
}

/// The default configuration extended with the HTML kinds and selectors.
pub fn config() -> TransformerConfig {
	let mut config = TransformerConfig::default().with_kinds(kinds());

	match selectors() {
		Ok(selectors) => config.selectors.extend(selectors),
		Err(error) => tracing::error!(%error, "builtin html selector failed to parse"),
	}

	config
}

pub fn transform(text: &str) -> TransformResult<String> {
	transform_with_config(text, config())
}

pub fn transform_with_config(text: &str, config: TransformerConfig) -> TransformResult<String> {
	Transformer::new(config).transform(text)
}

/// The HTML selectors with exactly `kinds` registered. The HTML kinds are
/// not added unless `kinds` includes them.
pub fn transform_with_kinds(
	text: &str,
	kinds: impl IntoIterator<Item = TagKind>,
) -> TransformResult<String> {
	transform_with_config(text, config().with_registry(TagRegistry::from_kinds(kinds)))
}

pub fn transform_with_variables(text: &str, variables: Variables) -> TransformResult<String> {
	transform_with_config(text, config().with_variables(variables))
}

pub fn transform_with_kinds_and_variables(
	text: &str,
	kinds: impl IntoIterator<Item = TagKind>,
	variables: Variables,
) -> TransformResult<String> {
	transform_with_config(
		text,
		config()
			.with_registry(TagRegistry::from_kinds(kinds))
			.with_variables(variables),
	)
}
