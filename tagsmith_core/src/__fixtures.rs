use std::cell::RefCell;
use std::rc::Rc;

use crate::TagKind;
use crate::Token;
use crate::TransformHooks;
use crate::Variables;

pub fn variables<const N: usize>(pairs: [(&str, &str); N]) -> Variables {
	pairs
		.into_iter()
		.map(|(name, value)| (name.to_string(), value.to_string()))
		.collect()
}

/// A page whose menu is assembled from items declared after it.
pub fn menu_document() -> &'static str {
	concat!(
		r#"<#:item id="page"><ul><#:anchor id="menu" /></ul></#:item>"#,
		r#"<#:item ref="menu" index="2"><li>b</li></#:item>"#,
		r#"<#:item ref="menu" index="1"><li>a</li></#:item>"#,
	)
}

pub fn html_page() -> &'static str {
	concat!(
		"<html><head><title>T</title></head><body><p>hi</p>",
		r#"<#:css path="site.css" selector="headend" />"#,
		r#"<#:js path="app.js" selector="bodyend" />"#,
		"<#:script>init();</#:script>",
		"</body></html>",
	)
}

pub fn note_kind() -> TagKind {
	TagKind::item("note").with_template("<aside>{0}</aside>")
}

pub fn tagsmith_toml() -> &'static str {
	r#"
flavor = "html"
id_prefix = "t"

[variables]
name = "World"

[templates]
quote = "<q>{0}</q>"

[selectors]
footer = "before:/<\\/footer>/i"

[[kinds]]
name = "note"
family = "item"
template = "quote"
"#
}

/// Records every hook invocation. `<#:shout />` variables are upper-cased
/// and `[[greeting]]` is expanded to an item before parsing.
#[derive(Debug, Clone, Default)]
pub struct RecordingHooks {
	pub events: Rc<RefCell<Vec<String>>>,
}

impl RecordingHooks {
	fn record(&self, event: impl Into<String>) {
		self.events.borrow_mut().push(event.into());
	}
}

impl TransformHooks for RecordingHooks {
	fn before_variables(&self, text: String) -> String {
		self.record("before_variables");
		text
	}

	fn after_variables(&self, text: String) -> String {
		self.record("after_variables");
		text
	}

	fn variable_match(&self, name: &str, value: &str, _variables: &Variables) -> Option<String> {
		self.record(format!("variable:{name}={value}"));
		(name == "shout").then(|| value.to_uppercase())
	}

	fn before_parse(&self, text: String) -> String {
		self.record("before_parse");
		text.replace("[[greeting]]", "<#:item>hi</#:item>")
	}

	fn token_match(&self, tag: &str, token: Option<&Token>) {
		self.record(format!("token:{tag}:{}", token.map_or("-", Token::id)));
	}

	fn after_parse(&self, _text: &str, tokens: &[Token]) {
		self.record(format!("after_parse:{}", tokens.len()));
	}
}
