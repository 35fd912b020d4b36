use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Render documents written with `<#:tag>` markup.",
	long_about = "tagsmith is a preprocessor for documents authored with lightweight `<#:tag>` \
	              markup.\n\nItems are pulled into the anchors that reference them, groups are \
	              attached to their targets, templates wrap content, and selectors place output \
	              anywhere in the document.\n\nQuick start:\n  tagsmith init             Create a \
	              tagsmith.toml\n  tagsmith render page.html Render a document to stdout\n  \
	              tagsmith check *.html     Verify documents render without errors\n  tagsmith \
	              list page.html   Show the tags of a document"
)]
pub struct TagsmithCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Directory searched for `tagsmith.toml`. Defaults to the current
	/// directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Create a commented sample `tagsmith.toml`.
	///
	/// If a config file already exists, this command is a no-op and exits
	/// successfully.
	Init,
	/// Render a document.
	///
	/// Substitutes variables, resolves every tag and prints the result. Use
	/// `-` to read the document from stdin.
	Render {
		/// The document to render, or `-` for stdin.
		file: PathBuf,

		/// Write the rendered document to this file instead of stdout.
		#[arg(long, short)]
		output: Option<PathBuf>,

		/// Set a variable, as `NAME=VALUE`. May be repeated. Enables variable
		/// substitution even when the config has no `[variables]` table.
		#[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_variable)]
		variables: Vec<(String, String)>,

		/// Use the HTML tag kinds and selectors regardless of the config
		/// flavor.
		#[arg(long, default_value_t = false)]
		html: bool,

		/// Skip `override` and `ref` validation.
		#[arg(long, default_value_t = false)]
		skip_validation: bool,

		/// Print a line diff between the input and the rendered output
		/// instead of the output itself.
		#[arg(long, default_value_t = false)]
		diff: bool,
	},
	/// Check that documents render without errors.
	///
	/// Every file is rendered and discarded. Exits with a non-zero status
	/// code if any file fails, which makes it suitable for CI.
	Check {
		/// The documents to check.
		#[arg(required = true)]
		files: Vec<PathBuf>,

		/// Use the HTML tag kinds and selectors regardless of the config
		/// flavor.
		#[arg(long, default_value_t = false)]
		html: bool,
	},
	/// List the tags of a document.
	///
	/// Tokenizes without rendering and prints every top-level tag with its
	/// id, index, reference, template, selector and nested anchors.
	List {
		/// The document to inspect, or `-` for stdin.
		file: PathBuf,

		/// Use the HTML tag kinds and selectors regardless of the config
		/// flavor.
		#[arg(long, default_value_t = false)]
		html: bool,

		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}

/// Parse a `NAME=VALUE` pair. The value may itself contain `=`.
pub fn parse_variable(raw: &str) -> Result<(String, String), String> {
	let (name, value) = raw
		.split_once('=')
		.ok_or_else(|| format!("expected `NAME=VALUE`, found `{raw}`"))?;

	if name.is_empty() {
		return Err(format!("missing variable name in `{raw}`"));
	}

	Ok((name.to_string(), value.to_string()))
}
