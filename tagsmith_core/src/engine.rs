use std::collections::HashMap;
use std::fmt;

use crate::NoHooks;
use crate::Selector;
use crate::TagFamily;
use crate::TagKind;
use crate::TagRegistry;
use crate::Template;
use crate::Token;
use crate::TokenIdx;
use crate::TransformError;
use crate::TransformHooks;
use crate::TransformResult;
use crate::TransformerConfig;
use crate::Variables;
use crate::Variant;
use crate::patterns::is_identifier;

const DEFAULT_ID_PREFIX: &str = "_tkn_";

/// Transforms documents with one configuration and hook set.
///
/// A transformer is not modified by a call; every call works on its own
/// [`Document`].
pub struct Transformer {
	config: TransformerConfig,
	hooks: Box<dyn TransformHooks>,
}

impl fmt::Debug for Transformer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Transformer")
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

impl Default for Transformer {
	fn default() -> Self {
		Self::new(TransformerConfig::default())
	}
}

impl Transformer {
	pub fn new(config: TransformerConfig) -> Self {
		Self {
			config,
			hooks: Box::new(NoHooks),
		}
	}

	#[must_use]
	pub fn with_hooks(mut self, hooks: impl TransformHooks + 'static) -> Self {
		self.hooks = Box::new(hooks);
		self
	}

	pub fn config(&self) -> &TransformerConfig {
		&self.config
	}

	/// Run the whole pipeline on `text`.
	pub fn transform(&self, text: &str) -> TransformResult<String> {
		self.parse(text)?.handle()
	}

	/// Substitute variables and tokenize `text` without resolving anything.
	pub fn parse(&self, text: &str) -> TransformResult<Document<'_>> {
		let mut text = text.to_string();

		if let Some(variables) = &self.config.variables {
			text = self.substitute_variables(text, variables)?;
		}

		let text = self.hooks.before_parse(text);
		let mut document = Document::new(self, text);
		document.tokenize()?;
		self.hooks.after_parse(&document.text, &document.tokens);

		Ok(document)
	}

	/// Replace every variable placeholder in `text` with its value from
	/// `variables`. The `func` capture is the lookup key when present.
	pub fn substitute_variables(&self, text: String, variables: &Variables) -> TransformResult<String> {
		let text = self.hooks.before_variables(text);
		let mut output = String::with_capacity(text.len());
		let mut last = 0;

		for caps in self.config.patterns.variable.regex().captures_iter(&text) {
			let Some(whole) = caps.get(0) else {
				continue;
			};
			let name = caps
				.name("func")
				.or_else(|| caps.name("tag"))
				.map_or("", |m| m.as_str());
			let value = variables
				.get(name)
				.ok_or_else(|| TransformError::UndefinedVariable(name.to_string()))?;
			let value = self
				.hooks
				.variable_match(name, value, variables)
				.unwrap_or_else(|| value.clone());

			tracing::trace!(name, "substituting variable");
			output.push_str(&text[last..whole.start()]);
			output.push_str(&value);
			last = whole.end();
		}

		output.push_str(&text[last..]);

		Ok(self.hooks.after_variables(output))
	}
}

/// The per-call state of one transformation: the buffer, the token arena
/// and every lookup table built from it.
#[derive(Debug)]
pub struct Document<'t> {
	transformer: &'t Transformer,
	text: String,
	tokens: Vec<Token>,
	/// Tokens matched directly in the buffer, in document order.
	top_level: Vec<TokenIdx>,
	ids: HashMap<String, TokenIdx>,
	/// One token list per registered kind, in registration order.
	groups: Vec<Vec<TokenIdx>>,
	/// Template-family tokens in discovery order.
	templates: Vec<TokenIdx>,
	/// Items bucketed by their `ref` attribute.
	references: HashMap<String, Vec<TokenIdx>>,
	counter: usize,
}

impl<'t> Document<'t> {
	fn new(transformer: &'t Transformer, text: String) -> Self {
		Self {
			transformer,
			text,
			tokens: Vec::new(),
			top_level: Vec::new(),
			ids: HashMap::new(),
			groups: vec![Vec::new(); transformer.config.kinds.len()],
			templates: Vec::new(),
			references: HashMap::new(),
			counter: 0,
		}
	}

	/// The buffer after variable substitution, with every tag still in
	/// place.
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Every token, including anchors nested in other tokens' values.
	pub fn tokens(&self) -> &[Token] {
		&self.tokens
	}

	pub fn token(&self, idx: TokenIdx) -> &Token {
		&self.tokens[idx.0]
	}

	/// Tokens matched directly in the buffer, in document order.
	pub fn top_level(&self) -> impl Iterator<Item = &Token> {
		self.top_level.iter().map(|idx| &self.tokens[idx.0])
	}

	pub fn get(&self, id: &str) -> Option<&Token> {
		self.ids.get(id).map(|idx| &self.tokens[idx.0])
	}

	pub fn position(&self, id: &str) -> Option<TokenIdx> {
		self.ids.get(id).copied()
	}

	fn config(&self) -> &'t TransformerConfig {
		&self.transformer.config
	}

	fn next_id(&mut self) -> String {
		self.counter += 1;
		let prefix = self
			.config()
			.id_prefix
			.as_deref()
			.unwrap_or(DEFAULT_ID_PREFIX);

		format!("{prefix}{}", self.counter)
	}

	fn tokenize(&mut self) -> TransformResult<()> {
		let text = std::mem::take(&mut self.text);
		let result = self.tokenize_text(&text);
		self.text = text;

		tracing::debug!(
			tokens = self.tokens.len(),
			top_level = self.top_level.len(),
			"tokenized document"
		);

		result
	}

	fn tokenize_text(&mut self, text: &str) -> TransformResult<()> {
		let transformer = self.transformer;
		let config = &transformer.config;

		for found in config.patterns.tag.find_iter(text) {
			let Some((kind_index, kind)) = config.kinds.resolve(found.tag) else {
				tracing::trace!(tag = found.tag, "skipping unregistered tag");
				transformer.hooks.token_match(found.tag, None);
				continue;
			};

			let token = Token::new(kind_index, kind, &found, || self.next_id())?;
			let idx = self.register(token)?;
			transformer.hooks.token_match(found.tag, Some(&self.tokens[idx.0]));
			self.top_level.push(idx);
			self.parse_anchors(idx)?;
		}

		Ok(())
	}

	fn register(&mut self, token: Token) -> TransformResult<TokenIdx> {
		if self.ids.contains_key(&token.id) {
			return Err(TransformError::DuplicateId(token.id));
		}

		let idx = TokenIdx(self.tokens.len());
		tracing::trace!(tag = %token.tag, id = %token.id, "registering token");

		self.ids.insert(token.id.clone(), idx);
		if let Some(group) = self.groups.get_mut(token.kind) {
			group.push(idx);
		}
		if token.family() == TagFamily::Template {
			self.templates.push(idx);
		}
		self.tokens.push(token);

		Ok(idx)
	}

	/// Find the anchors inside the value of `parent`. Anchors are not
	/// searched for inside other anchors.
	fn parse_anchors(&mut self, parent: TokenIdx) -> TransformResult<()> {
		let config = self.config();
		let Some(value) = self.tokens[parent.0].value.clone() else {
			return Ok(());
		};
		let Some((kind_index, kind)) = config.kinds.anchor_kind() else {
			return Ok(());
		};

		let mut anchors = Vec::new();
		for found in config.patterns.anchor.find_iter(&value) {
			let mut token = Token::new(kind_index, kind, &found, || self.next_id())?;
			token.variant = Variant::Anchor {
				parent: Some(parent),
			};
			anchors.push(self.register(token)?);
		}

		self.tokens[parent.0].anchors = anchors;

		Ok(())
	}

	/// Check every `override` and `ref` attribute. The first violation is
	/// returned.
	pub fn validate(&self) -> TransformResult<()> {
		let config = self.config();

		for token in &self.tokens {
			let (attribute, expected, target) = match &token.variant {
				Variant::Template {
					overrides: Some(target),
				} if !self.ids.contains_key(target) && !config.templates.contains_key(target) => {
					("override", "token or builtin template", target)
				}
				Variant::Group {
					reference: Some(target),
				}
				| Variant::Item {
					reference: Some(target),
				} if !self.ids.contains_key(target) => ("ref", "token", target),
				_ => continue,
			};

			return Err(TransformError::Validation {
				tag: token.tag.clone(),
				id: token.id.clone(),
				attribute,
				expected,
				target: target.clone(),
			});
		}

		Ok(())
	}

	/// Bucket the members of every item-family group by `ref` and order each
	/// bucket by index, keeping document order on ties.
	fn group_references(&mut self) {
		for group in &self.groups {
			let Some(first) = group.first() else {
				continue;
			};

			if self.tokens[first.0].family() != TagFamily::Item {
				continue;
			}

			for &idx in group {
				if let Some(reference) = self.tokens[idx.0].variant.reference() {
					self.references
						.entry(reference.to_string())
						.or_default()
						.push(idx);
				}
			}
		}

		let tokens = &self.tokens;
		for bucket in self.references.values_mut() {
			bucket.sort_by_key(|idx| (tokens[idx.0].index, *idx));
		}

		tracing::debug!(references = self.references.len(), "grouped references");
	}

	/// Run the begin callback of every non-empty group, then the end callback
	/// of every non-empty group, both in kind registration order.
	fn run_callbacks(&mut self) -> TransformResult<()> {
		for kind in 0..self.groups.len() {
			if let Some(family) = self.group_family(kind) {
				self.begin_handle(kind, family)?;
			}
		}

		for kind in 0..self.groups.len() {
			if let Some(family) = self.group_family(kind) {
				self.end_handle(kind, family)?;
			}
		}

		Ok(())
	}

	fn group_family(&self, kind: usize) -> Option<TagFamily> {
		self.groups[kind]
			.first()
			.map(|idx| self.tokens[idx.0].family())
	}

	fn begin_handle(&mut self, kind: usize, family: TagFamily) -> TransformResult<()> {
		if family != TagFamily::Anchor {
			return Ok(());
		}

		for idx in self.groups[kind].clone() {
			let Variant::Anchor { parent } = self.tokens[idx.0].variant else {
				continue;
			};

			match parent {
				None => {
					let items = self
						.references
						.get(&self.tokens[idx.0].id)
						.cloned()
						.unwrap_or_default();

					for item in &items {
						self.tokens[item.0].handled = true;
					}
					self.tokens[idx.0].managed.extend(items);
				}
				Some(parent) => {
					self.handle_anchors(parent, &mut Vec::new())?;
				}
			}
		}

		Ok(())
	}

	fn end_handle(&mut self, kind: usize, family: TagFamily) -> TransformResult<()> {
		match family {
			TagFamily::Template | TagFamily::Plain => {
				for idx in &self.groups[kind] {
					self.tokens[idx.0].handled = true;
				}
			}
			TagFamily::Group => {
				for idx in self.groups[kind].clone() {
					let token = &self.tokens[idx.0];
					let target = token
						.variant
						.reference()
						.and_then(|reference| self.ids.get(reference))
						.copied()
						.ok_or_else(|| {
							TransformError::UnresolvedReference {
								tag: token.tag.clone(),
								id: token.id.clone(),
								reference: token.variant.reference().unwrap_or_default().to_string(),
							}
						})?;

					self.tokens[target.0].managed.push(idx);
					self.tokens[idx.0].handled = true;
				}
			}
			TagFamily::Anchor | TagFamily::Item => {}
		}

		Ok(())
	}

	/// Replace every anchor nested in the value of `idx` with the outputs of
	/// the items referencing it. Items are inlined before their output is
	/// taken and are marked handled.
	fn handle_anchors(&mut self, idx: TokenIdx, visiting: &mut Vec<TokenIdx>) -> TransformResult<()> {
		if self.tokens[idx.0].anchors_handled {
			return Ok(());
		}

		if visiting.contains(&idx) {
			return Err(TransformError::CircularReference(self.tokens[idx.0].id.clone()));
		}

		visiting.push(idx);

		let mut contents = Vec::with_capacity(self.tokens[idx.0].anchors.len());
		for anchor in self.tokens[idx.0].anchors.clone() {
			let items = self
				.references
				.get(&self.tokens[anchor.0].id)
				.cloned()
				.unwrap_or_default();

			let mut content = String::new();
			for &item in &items {
				self.handle_anchors(item, visiting)?;
				self.tokens[item.0].handled = true;
				content.push_str(&self.output_in(item, &self.text, &mut Vec::new())?);
			}

			let anchor_token = &self.tokens[anchor.0];
			if !items.is_empty() {
				if let Some(name) = anchor_token.template.as_deref() {
					content = self.find_template(name, anchor_token)?.apply(&[content.as_str()])?;
				}
			}

			contents.push((anchor_token.span.clone(), content));
		}

		let token = &mut self.tokens[idx.0];
		if let Some(value) = token.value.as_mut() {
			for (span, content) in contents.into_iter().rev() {
				value.replace_range(span, &content);
			}
		}
		token.anchors_handled = true;

		visiting.pop();

		Ok(())
	}

	/// The template named `name`: inline when it is not a bare identifier,
	/// otherwise the newest template token whose `override` or id matches,
	/// otherwise the builtin template table.
	fn find_template<'s>(&'s self, name: &'s str, requester: &Token) -> TransformResult<Template<'s>> {
		if !is_identifier(name) {
			return Ok(Template::inline(name));
		}

		for idx in self.templates.iter().rev() {
			let token = &self.tokens[idx.0];
			let Variant::Template { overrides } = &token.variant else {
				continue;
			};

			if overrides.as_deref() == Some(name) || token.id == name {
				return Ok(Template::new(&token.id, token.value.as_deref().unwrap_or_default()));
			}
		}

		self.config()
			.templates
			.get(name)
			.map(|pattern| Template::new(name, pattern))
			.ok_or_else(|| {
				TransformError::TemplateNotFound {
					name: name.to_string(),
					id: requester.id.clone(),
				}
			})
	}

	/// The output of a token against the parsed buffer.
	pub fn output(&self, idx: TokenIdx) -> TransformResult<String> {
		self.output_in(idx, &self.text, &mut Vec::new())
	}

	/// The output of a token. Selectors carried by the token are matched
	/// against `text`.
	fn output_in(&self, idx: TokenIdx, text: &str, visiting: &mut Vec<TokenIdx>) -> TransformResult<String> {
		if visiting.contains(&idx) {
			return Err(TransformError::CircularReference(self.tokens[idx.0].id.clone()));
		}

		visiting.push(idx);
		let output = self.compute_output(idx, text, visiting);
		visiting.pop();

		output
	}

	fn compute_output(&self, idx: TokenIdx, text: &str, visiting: &mut Vec<TokenIdx>) -> TransformResult<String> {
		let token = &self.tokens[idx.0];

		let Some(name) = token.template.as_deref() else {
			return self.composed(token, text, visiting);
		};

		let template = self.find_template(name, token)?;
		let argument = self
			.kind(token)
			.and_then(|kind| kind.argument.as_deref())
			.and_then(|attribute| token.attributes.get(attribute));

		if let Some(argument) = argument {
			return template.apply(&[argument.as_ref()]);
		}

		if let Some(source) = token.selector.as_deref() {
			let selector = Selector::resolve(source, &self.config().selectors)?;
			let mut output = String::new();

			for matched in selector.matches(text) {
				if !matched.is_empty() {
					output.push_str(&template.apply(&[matched])?);
				}
			}

			return Ok(output);
		}

		let composed = self.composed(token, text, visiting)?;
		template.apply(&[composed.as_str()])
	}

	/// Managed outputs in index order, or the token's own value when there
	/// are none.
	fn composed(&self, token: &Token, text: &str, visiting: &mut Vec<TokenIdx>) -> TransformResult<String> {
		let mut managed = token.managed.clone();
		managed.sort_by_key(|idx| self.tokens[idx.0].index);

		let mut composed = String::new();
		for child in managed {
			composed.push_str(&self.output_in(child, text, visiting)?);
		}

		if composed.is_empty() {
			composed = token.value.clone().unwrap_or_default();
		}

		Ok(composed)
	}

	fn kind(&self, token: &Token) -> Option<&'t TagKind> {
		self.config().kinds.get(token.kind)
	}

	/// Replace every top-level span with its output. Handled tokens leave
	/// nothing behind; tokens with a selector are returned for placement.
	fn substitute(&self) -> TransformResult<(String, Vec<TokenIdx>)> {
		let mut output = String::with_capacity(self.text.len());
		let mut deferred = Vec::new();
		let mut last = 0;

		for &idx in &self.top_level {
			let token = &self.tokens[idx.0];
			output.push_str(&self.text[last..token.span.start]);
			last = token.span.end;

			if token.handled {
				continue;
			}

			if token.selector.is_some() {
				deferred.push(idx);
				continue;
			}

			output.push_str(&self.output(idx)?);
		}

		output.push_str(&self.text[last..]);

		Ok((output, deferred))
	}

	/// Splice deferred tokens into `buffer`, ordered by selector and then by
	/// descending index.
	fn place(&self, mut buffer: String, mut deferred: Vec<TokenIdx>) -> TransformResult<String> {
		deferred.sort_by(|a, b| {
			let a = &self.tokens[a.0];
			let b = &self.tokens[b.0];
			a.selector.cmp(&b.selector).then(b.index.cmp(&a.index))
		});

		for idx in deferred {
			let token = &self.tokens[idx.0];
			let source = token.selector.as_deref().unwrap_or_default();
			let selector = Selector::resolve(source, &self.config().selectors)?;
			let output = self.output_in(idx, &buffer, &mut Vec::new())?;

			if selector.place(&mut buffer, &output) == 0 {
				tracing::warn!(
					id = %token.id,
					selector = source,
					"selector matched nothing, output dropped"
				);
			}
		}

		Ok(buffer)
	}

	/// Validate, resolve and reassemble the document.
	pub fn handle(mut self) -> TransformResult<String> {
		if !self.config().skip_validation {
			self.validate()?;
		}

		self.group_references();
		self.run_callbacks()?;

		let (buffer, deferred) = self.substitute()?;
		tracing::debug!(deferred = deferred.len(), "substituted token output");

		self.place(buffer, deferred)
	}
}

/// Transform `text` with the standard tag kinds.
///
/// ```rust
/// let output = tagsmith_core::transform(
/// 	r#"<#:tpl id="t1">[{0}]</#:tpl><#:item tpl="t1">X</#:item>"#,
/// )
/// .unwrap();
/// assert_eq!(output, "[X]");
/// ```
pub fn transform(text: &str) -> TransformResult<String> {
	transform_with_config(text, TransformerConfig::default())
}

pub fn transform_with_config(text: &str, config: TransformerConfig) -> TransformResult<String> {
	Transformer::new(config).transform(text)
}

/// Transform `text` recognizing only `kinds`. The standard kinds are not
/// added; use [`TransformerConfig::with_kinds`] to extend them instead.
pub fn transform_with_kinds(
	text: &str,
	kinds: impl IntoIterator<Item = TagKind>,
) -> TransformResult<String> {
	transform_with_config(
		text,
		TransformerConfig::default().with_registry(TagRegistry::from_kinds(kinds)),
	)
}

/// Transform `text`, substituting variable placeholders first.
pub fn transform_with_variables(text: &str, variables: Variables) -> TransformResult<String> {
	transform_with_config(text, TransformerConfig::default().with_variables(variables))
}

pub fn transform_with_kinds_and_variables(
	text: &str,
	kinds: impl IntoIterator<Item = TagKind>,
	variables: Variables,
) -> TransformResult<String> {
	transform_with_config(
		text,
		TransformerConfig::default()
			.with_registry(TagRegistry::from_kinds(kinds))
			.with_variables(variables),
	)
}
