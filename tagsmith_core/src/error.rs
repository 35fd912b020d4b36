use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum TransformError {
	#[error(transparent)]
	#[diagnostic(code(tagsmith::io_error))]
	Io(#[from] std::io::Error),

	#[error("variable with name `{0}` is not found")]
	#[diagnostic(
		code(tagsmith::undefined_variable),
		help("add `{0}` to the variable mapping or remove the `<#:{0} />` placeholder")
	)]
	UndefinedVariable(String),

	#[error("duplicate token id `{0}`")]
	#[diagnostic(
		code(tagsmith::duplicate_id),
		help("every `id` attribute must be unique within a document")
	)]
	DuplicateId(String),

	#[error("duplicate attribute `{name}` on `<#:{tag}>`")]
	#[diagnostic(code(tagsmith::duplicate_attribute))]
	DuplicateAttribute { tag: String, name: String },

	#[error("`{tag}` token `{id}` has an invalid `index` attribute: `{value}`")]
	#[diagnostic(
		code(tagsmith::invalid_index),
		help("`index` must be an integer, e.g. `index=\"10\"`")
	)]
	InvalidIndex {
		tag: String,
		id: String,
		value: String,
	},

	#[error("`{tag}` token `{id}`: `{attribute}` attribute refers to unknown {expected} `{target}`")]
	#[diagnostic(
		code(tagsmith::validation),
		help("define the referenced token earlier or later in the document, or enable `skip_validation`")
	)]
	Validation {
		tag: String,
		id: String,
		attribute: &'static str,
		expected: &'static str,
		target: String,
	},

	#[error("`{tag}` token `{id}` refers to token `{reference}` which does not exist")]
	#[diagnostic(code(tagsmith::unresolved_reference))]
	UnresolvedReference {
		tag: String,
		id: String,
		reference: String,
	},

	#[error("template `{name}` is not found (used by token `{id}`)")]
	#[diagnostic(
		code(tagsmith::template_not_found),
		help("declare it with `<#:tpl id=\"{name}\">...</#:tpl>` or register a builtin template")
	)]
	TemplateNotFound { name: String, id: String },

	#[error("template `{template}` could not be applied: {reason}")]
	#[diagnostic(code(tagsmith::template_format))]
	TemplateFormat { template: String, reason: String },

	#[error("selector `{0}` is not found in the predefined selectors")]
	#[diagnostic(
		code(tagsmith::unknown_selector),
		help("register the selector in the configuration or use an inline `/pattern/` selector")
	)]
	UnknownSelector(String),

	#[error("selector `{selector}` is invalid: {reason}")]
	#[diagnostic(
		code(tagsmith::malformed_selector),
		help(
			"selectors look like `[before|after|replace][[group]][.pseudo(n)]:/pattern/flags`, \
			 e.g. `before:[0].first:/<\\/body>/i`"
		)
	)]
	MalformedSelector { selector: String, reason: String },

	#[error("circular reference detected at token `{0}`")]
	#[diagnostic(code(tagsmith::circular_reference))]
	CircularReference(String),

	#[error("invalid {name} pattern: {reason}")]
	#[diagnostic(code(tagsmith::invalid_pattern))]
	InvalidPattern { name: &'static str, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(tagsmith::config_parse),
		help("check that tagsmith.toml is valid TOML")
	)]
	ConfigParse(String),
}

pub type TransformResult<T> = Result<T, TransformError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
