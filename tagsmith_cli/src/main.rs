use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use serde::Serialize;
use similar::ChangeTag;
use similar::TextDiff;
use tagsmith_cli::Commands;
use tagsmith_cli::OutputFormat;
use tagsmith_cli::TagsmithCli;
use tagsmith_core::AnyEmptyResult;
use tagsmith_core::AnyResult;
use tagsmith_core::CONFIG_FILE_CANDIDATES;
use tagsmith_core::Document;
use tagsmith_core::Flavor;
use tagsmith_core::TagFamily;
use tagsmith_core::TagsmithConfig;
use tagsmith_core::Token;
use tagsmith_core::TransformError;
use tagsmith_core::Transformer;
use tagsmith_core::TransformerConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,dimmed) => {
		if color_enabled() {
			format!("{}", $text.dimmed())
		} else {
			format!("{}", $text)
		}
	};
}

const SAMPLE_CONFIG: &str = r#"# tagsmith configuration

# `text` uses the standard tags only. `html` adds the `js`, `css`, `script`
# and `style` tags and the `headstart`, `headend`, `bodystart` and `bodyend`
# selectors.
flavor = "text"

# Leave `override` and `ref` targets unchecked.
# skip_validation = false

# Prefix for the ids of tags written without an `id`.
# id_prefix = "_tkn_"

# Values for `<#:name />` placeholders. Without this table placeholders are
# left alone.
# [variables]
# title = "My page"

# Named templates, usable as `tpl="quote"`.
# [templates]
# quote = "<blockquote>{0}</blockquote>"

# Named selectors, usable as `selector="footer"`.
# [selectors]
# footer = "before:/<\\/footer>/i"

# Additional tag kinds.
# [[kinds]]
# name = "note"
# family = "item"
# template = "quote"
"#;

fn main() {
	let args = TagsmithCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Render {
			file,
			output,
			variables,
			html,
			skip_validation,
			diff,
		}) => {
			let options = RenderOptions {
				variables,
				html: *html,
				skip_validation: *skip_validation,
			};
			run_render(&args, file, output.as_deref(), &options, *diff)
		}
		Some(Commands::Check { files, html }) => run_check(&args, files, *html),
		Some(Commands::List { file, html, format }) => run_list(&args, file, *html, *format),
		None => {
			eprintln!("No subcommand specified. Run `tagsmith --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<TransformError>() {
			Ok(error) => {
				let report: miette::Report = (*error).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr. `TAGSMITH_LOG` takes an `EnvFilter` directive; without it
/// only warnings are shown, or debug output with `--verbose`.
fn init_tracing(verbose: bool, use_color: bool) {
	let fallback = if verbose { "tagsmith_core=debug,warn" } else { "warn" };

	tracing_subscriber::registry()
		.with(EnvFilter::try_from_env("TAGSMITH_LOG").unwrap_or_else(|_| EnvFilter::new(fallback)))
		.with(
			tracing_subscriber::fmt::layer()
				.with_writer(std::io::stderr)
				.with_ansi(use_color)
				.without_time(),
		)
		.init();
}

fn resolve_root(args: &TagsmithCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

struct RenderOptions<'a> {
	variables: &'a [(String, String)],
	html: bool,
	skip_validation: bool,
}

impl RenderOptions<'_> {
	fn flavor(html: bool) -> Self {
		RenderOptions {
			variables: &[],
			html,
			skip_validation: false,
		}
	}
}

/// Build the engine configuration from the discovered `tagsmith.toml` and
/// the command line overrides.
fn load_config(args: &TagsmithCli, options: &RenderOptions<'_>) -> AnyResult<TransformerConfig> {
	let root = resolve_root(args);
	tracing::debug!(root = %root.display(), "discovering config");
	let file_config = TagsmithConfig::load(&root)?;

	if args.verbose {
		match TagsmithConfig::resolve_path(&root) {
			Some(path) => eprintln!("Using config: {}", path.display()),
			None => eprintln!("No config file found in {}", root.display()),
		}
	}

	let mut config = match file_config {
		Some(mut file_config) => {
			if options.html {
				file_config.flavor = Flavor::Html;
			}
			file_config.into_transformer_config()?
		}
		None if options.html => TransformerConfig::html(),
		None => TransformerConfig::default(),
	};

	config.skip_validation |= options.skip_validation;

	if !options.variables.is_empty() {
		config
			.variables
			.get_or_insert_with(Default::default)
			.extend(options.variables.iter().cloned());
	}

	Ok(config)
}

fn read_document(file: &Path) -> Result<String, TransformError> {
	if file == Path::new("-") {
		let mut content = String::new();
		std::io::stdin().read_to_string(&mut content)?;
		return Ok(content);
	}

	Ok(std::fs::read_to_string(file)?)
}

fn display_name(file: &Path) -> String {
	if file == Path::new("-") {
		"<stdin>".to_string()
	} else {
		file.display().to_string()
	}
}

fn run_init(args: &TagsmithCli) -> AnyEmptyResult {
	let root = resolve_root(args);

	if let Some(existing) = TagsmithConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(());
	}

	let config_path = root.join(CONFIG_FILE_CANDIDATES[0]);
	std::fs::write(&config_path, SAMPLE_CONFIG)?;
	println!("Created config file: {}", config_path.display());

	println!();
	println!("Next steps:");
	println!("  1. Edit {} to add variables, templates or kinds", config_path.display());
	println!("  2. Write a document with tags:");
	println!("     <#:item ref=\"menu\">Home</#:item>");
	println!("     <#:anchor id=\"menu\" />");
	println!("  3. Run `tagsmith render <FILE>` to render it");

	Ok(())
}

fn run_render(
	args: &TagsmithCli,
	file: &Path,
	output: Option<&Path>,
	options: &RenderOptions<'_>,
	show_diff: bool,
) -> AnyEmptyResult {
	let config = load_config(args, options)?;
	let input = read_document(file)?;
	let rendered = Transformer::new(config).transform(&input)?;

	if let Some(output) = output {
		std::fs::write(output, &rendered)?;
		if args.verbose {
			eprintln!("Rendered {} -> {}", display_name(file), output.display());
		}
	}

	if show_diff {
		print_diff(&input, &rendered);
	} else if output.is_none() {
		print!("{rendered}");
	}

	Ok(())
}

fn run_check(args: &TagsmithCli, files: &[PathBuf], html: bool) -> AnyEmptyResult {
	let transformer = Transformer::new(load_config(args, &RenderOptions::flavor(html))?);
	let mut failed = 0;

	for file in files {
		let result = read_document(file).and_then(|input| transformer.transform(&input));

		match result {
			Ok(_) => {
				if args.verbose {
					println!("{} {}", colored!("ok", green), display_name(file));
				}
			}
			Err(error) => {
				failed += 1;
				eprintln!("{} {}", colored!("failed:", red), display_name(file));
				eprintln!("{:?}", miette::Report::new(error));
			}
		}
	}

	if failed > 0 {
		eprintln!(
			"\n{} of {} document(s) failed to render.",
			failed,
			files.len()
		);
		process::exit(1);
	}

	println!(
		"Check passed: {} document(s) rendered without errors.",
		files.len()
	);

	Ok(())
}

/// The JSON shape of a listed tag.
#[derive(Debug, Serialize)]
struct TokenSummary<'a> {
	tag: &'a str,
	id: &'a str,
	family: TagFamily,
	index: String,
	#[serde(rename = "ref")]
	reference: Option<&'a str>,
	template: Option<&'a str>,
	selector: Option<&'a str>,
	anchors: Vec<&'a str>,
	start: usize,
	end: usize,
}

impl<'a> TokenSummary<'a> {
	fn new(document: &'a Document<'_>, token: &'a Token) -> Self {
		let span = token.span();

		Self {
			tag: token.tag(),
			id: token.id(),
			family: token.family(),
			index: token.index().to_string(),
			reference: token.variant().reference(),
			template: token.template(),
			selector: token.selector(),
			anchors: token
				.anchors()
				.iter()
				.map(|idx| document.token(*idx).id())
				.collect(),
			start: span.start,
			end: span.end,
		}
	}
}

fn run_list(args: &TagsmithCli, file: &Path, html: bool, format: OutputFormat) -> AnyEmptyResult {
	let transformer = Transformer::new(load_config(args, &RenderOptions::flavor(html))?);
	let input = read_document(file)?;
	let document = transformer.parse(&input)?;
	let summaries: Vec<_> = document
		.top_level()
		.map(|token| TokenSummary::new(&document, token))
		.collect();

	match format {
		OutputFormat::Json => {
			println!("{}", serde_json::to_string_pretty(&summaries)?);
		}
		OutputFormat::Text => {
			if summaries.is_empty() {
				println!("No tags found in {}.", display_name(file));
				return Ok(());
			}

			println!(
				"{} ({} tag(s))",
				colored!(display_name(file), bold),
				summaries.len()
			);
			for summary in &summaries {
				print_summary(summary);
			}
		}
	}

	Ok(())
}

fn print_summary(summary: &TokenSummary<'_>) {
	let mut line = format!(
		"  {} {}",
		colored!(format!("<#:{}>", summary.tag), bold),
		summary.id
	);
	line.push_str(&format!(" index={}", summary.index));

	let optional = [
		("ref", summary.reference),
		("tpl", summary.template),
		("selector", summary.selector),
	];
	for (label, value) in optional {
		if let Some(value) = value {
			line.push_str(&format!(" {label}={value}"));
		}
	}

	if !summary.anchors.is_empty() {
		line.push_str(&format!(" anchors=[{}]", summary.anchors.join(", ")));
	}

	println!("{line}");
	println!(
		"    {}",
		colored!(format!("{}..{} ({})", summary.start, summary.end, summary.family), dimmed)
	);
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		let line = match change.tag() {
			ChangeTag::Delete => colored!(format!("-{change}"), red),
			ChangeTag::Insert => colored!(format!("+{change}"), green),
			ChangeTag::Equal => format!(" {change}"),
		};
		print!("{line}");
		if change.missing_newline() {
			println!();
		}
	}
}
