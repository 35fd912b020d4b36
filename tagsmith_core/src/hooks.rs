use crate::Token;
use crate::Variables;

/// Callbacks that run inline while a document is transformed.
///
/// Every method has a no-op default, so implementors only override what they
/// need. Hooks returning a `String` may rewrite the buffer.
pub trait TransformHooks {
	/// Runs before variable placeholders are substituted.
	fn before_variables(&self, text: String) -> String {
		text
	}

	/// Runs after variable placeholders are substituted.
	fn after_variables(&self, text: String) -> String {
		text
	}

	/// Runs for every variable placeholder. Returning `Some` replaces the
	/// value looked up in `variables`.
	fn variable_match(&self, _name: &str, _value: &str, _variables: &Variables) -> Option<String> {
		None
	}

	/// Runs before the buffer is scanned for tags.
	fn before_parse(&self, text: String) -> String {
		text
	}

	/// Runs for every tag span found. `token` is `None` for tags whose name is
	/// not registered.
	fn token_match(&self, _tag: &str, _token: Option<&Token>) {}

	/// Runs once the buffer has been tokenized.
	fn after_parse(&self, _text: &str, _tokens: &[Token]) {}
}

/// The hook set used when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl TransformHooks for NoHooks {}
