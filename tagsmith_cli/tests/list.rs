mod common;

use clap::Parser;
use serde_json::Value;
use tagsmith_cli::Commands;
use tagsmith_cli::OutputFormat;
use tagsmith_cli::TagsmithCli;
use tagsmith_core::AnyEmptyResult;

const MENU: &str = concat!(
	r#"<#:item id="page"><ul><#:anchor id="menu" /></ul></#:item>"#,
	r#"<#:item ref="menu" index="2"><li>b</li></#:item>"#,
	r#"<#:item ref="menu" index="1"><li>a</li></#:item>"#,
);

#[test]
fn list_prints_top_level_tags() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("page.txt"), MENU)?;

	let output = common::tagsmith_cmd()
		.args(["list", "page.txt"])
		.current_dir(tmp.path())
		.output()?;

	assert!(output.status.success());
	similar_asserts::assert_eq!(
		String::from_utf8(output.stdout)?,
		concat!(
			"page.txt (3 tag(s))\n",
			"  <#:item> page index=+inf anchors=[menu]\n",
			"    0..58 (item)\n",
			"  <#:item> _tkn_1 index=2 ref=menu\n",
			"    58..106 (item)\n",
			"  <#:item> _tkn_2 index=1 ref=menu\n",
			"    106..154 (item)\n",
		)
	);

	Ok(())
}

#[test]
fn list_json_describes_each_tag() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("page.txt"), MENU)?;

	let output = common::tagsmith_cmd()
		.args(["list", "page.txt", "--format", "json"])
		.current_dir(tmp.path())
		.output()?;

	assert!(output.status.success());
	let json: Value = serde_json::from_slice(&output.stdout)?;
	let tags = json.as_array().ok_or("expected an array")?;

	assert_eq!(tags.len(), 3);
	assert_eq!(tags[0]["id"], "page");
	assert_eq!(tags[0]["family"], "item");
	assert_eq!(tags[0]["anchors"], serde_json::json!(["menu"]));
	assert_eq!(tags[0]["ref"], Value::Null);
	assert_eq!(tags[1]["ref"], "menu");
	assert_eq!(tags[1]["index"], "2");
	assert_eq!(tags[2]["index"], "1");
	assert_eq!(tags[2]["start"], 106);

	Ok(())
}

#[test]
fn list_does_not_resolve_references() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	// Listing only tokenizes, so a dangling `ref` is not an error.
	common::tagsmith_cmd()
		.args(["list", "-"])
		.arg("--path")
		.arg(tmp.path())
		.write_stdin(r#"<#:item ref="missing" tpl="[{0}]">x</#:item>"#)
		.assert()
		.success()
		.stdout(predicates::str::contains("ref=missing tpl=[{0}]"));

	Ok(())
}

#[test]
fn list_reports_documents_without_tags() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::tagsmith_cmd()
		.args(["list", "-"])
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("plain text")
		.assert()
		.success()
		.stdout("No tags found in <stdin>.\n");

	Ok(())
}

#[test]
fn list_reports_duplicate_ids() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::tagsmith_cmd()
		.args(["list", "-"])
		.arg("--path")
		.arg(tmp.path())
		.write_stdin(r#"<#:item id="a">1</#:item><#:item id="a">2</#:item>"#)
		.assert()
		.code(2)
		.stderr(predicates::str::contains("duplicate token id `a`"));

	Ok(())
}

#[test]
fn list_format_defaults_to_text() {
	let cli = TagsmithCli::parse_from(["tagsmith", "list", "page.txt"]);
	match cli.command {
		Some(Commands::List { format, html, .. }) => {
			assert_eq!(format, OutputFormat::Text);
			assert!(!html);
		}
		_ => panic!("expected List command"),
	}

	let cli = TagsmithCli::parse_from(["tagsmith", "list", "page.txt", "--format", "json"]);
	match cli.command {
		Some(Commands::List { format, .. }) => assert_eq!(format, OutputFormat::Json),
		_ => panic!("expected List command"),
	}
}
