//! `tagsmith_core` is the engine behind [tagsmith](https://docs.rs/tagsmith_cli), a preprocessor for documents authored with lightweight `<#:tag>` markup. Tags are resolved against each other (items pulled into anchors, groups attached to their targets, templates looked up by name) and the results are spliced back into the document, either where the tag stood or at a position found by a selector.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Document text
//!   -> Variable substitution (`<#:name />` placeholders, only when a mapping is configured)
//!   -> Tokenizer (tag spans -> tokens, nested anchors, id registration)
//!   -> Validation (`override` and `ref` targets must exist)
//!   -> Reference grouping (items bucketed by `ref`, ordered by `index`)
//!   -> Group callbacks (anchors adopt items, groups attach to targets, templates are consumed)
//!   -> Output substitution (each span replaced by its output)
//!   -> Selector placement (deferred output spliced at selector matches)
//! ```
//!
//! ## Tags
//!
//! - `<#:item>`: a content unit. With `ref="anchor-id"` it moves to that anchor.
//! - `<#:anchor>`: a placeholder for the items referencing it, ordered by their `index` attribute. Anchors may also appear inside the value of another tag.
//! - `<#:group>`: attaches its output to the token named by `ref`.
//! - `<#:tpl>`: a positional template such as `[{0}]`. `override="name"` replaces another template for every lookup.
//!
//! Any tag may carry `tpl` (a template name or an inline template) and `selector`. Additional kinds are registered through [`TagKind`]; the [`html`] module adds `js`, `css`, `script` and `style`.
//!
//! ## Selectors
//!
//! `[before|after|replace][[group]][.pseudo(n)]:/pattern/flags`, for example `before:[0].last:/<\/ul>/i`. A bare name such as `headend` refers to a predefined selector.
//!
//! ## Modules
//!
//! - [`config`]: Programmatic [`TransformerConfig`] and the `tagsmith.toml` file format.
//! - [`html`]: The HTML tag kinds and insertion points.
//! - [`markup`]: Entity decoding and tag rendering helpers.
//!
//! ## Quick Start
//!
//! ```rust
//! use tagsmith_core::transform;
//!
//! let output = transform(r#"<#:item id="x1" ref="a1">Hello</#:item><#:anchor id="a1"/>"#).unwrap();
//! assert_eq!(output, "Hello");
//! ```

pub use config::*;
pub use engine::*;
pub use error::*;
pub use hooks::*;
pub use patterns::*;
pub use registry::*;
pub use selector::*;
pub use template::*;
pub use tokens::*;

pub mod config;
mod engine;
#[allow(unused_assignments)]
mod error;
mod hooks;
pub mod html;
pub(crate) mod lexer;
pub mod markup;
mod patterns;
mod registry;
mod selector;
mod template;
mod tokens;

#[cfg(test)]
mod __fixtures;
