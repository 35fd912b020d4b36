mod common;

use tagsmith_core::AnyEmptyResult;

const GREETING: &str = "Hello <#:name />";

#[test]
fn config_variables_enable_substitution() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("tagsmith.toml"),
		"[variables]\nname = \"World\"\n",
	)?;

	common::tagsmith_cmd()
		.args(["render", "-"])
		.current_dir(tmp.path())
		.write_stdin(GREETING)
		.assert()
		.success()
		.stdout("Hello World");

	Ok(())
}

#[test]
fn command_line_variables_override_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("tagsmith.toml"),
		"[variables]\nname = \"World\"\n",
	)?;

	common::tagsmith_cmd()
		.args(["render", "-", "--var", "name=Cli"])
		.arg("--path")
		.arg(tmp.path())
		.write_stdin(GREETING)
		.assert()
		.success()
		.stdout("Hello Cli");

	Ok(())
}

#[test]
fn root_config_takes_precedence() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join(".config"))?;
	std::fs::write(
		tmp.path().join("tagsmith.toml"),
		"[variables]\nname = \"root\"\n",
	)?;
	std::fs::write(
		tmp.path().join(".tagsmith.toml"),
		"[variables]\nname = \"hidden\"\n",
	)?;
	std::fs::write(
		tmp.path().join(".config/tagsmith.toml"),
		"[variables]\nname = \"nested\"\n",
	)?;

	common::tagsmith_cmd()
		.args(["render", "-"])
		.arg("--path")
		.arg(tmp.path())
		.write_stdin(GREETING)
		.assert()
		.success()
		.stdout("Hello root");

	std::fs::remove_file(tmp.path().join("tagsmith.toml"))?;

	common::tagsmith_cmd()
		.args(["render", "-"])
		.arg("--path")
		.arg(tmp.path())
		.write_stdin(GREETING)
		.assert()
		.success()
		.stdout("Hello hidden");

	Ok(())
}

#[test]
fn config_kinds_and_templates_are_registered() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("tagsmith.toml"),
		concat!(
			"[templates]\n",
			"quote = \"<q>{0}</q>\"\n",
			"\n",
			"[[kinds]]\n",
			"name = \"note\"\n",
			"family = \"item\"\n",
			"template = \"quote\"\n",
		),
	)?;

	common::tagsmith_cmd()
		.args(["render", "-"])
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("<#:note>hi</#:note>")
		.assert()
		.success()
		.stdout("<q>hi</q>");

	Ok(())
}

#[test]
fn html_flavor_in_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("tagsmith.toml"), "flavor = \"html\"\n")?;

	common::tagsmith_cmd()
		.args(["render", "-"])
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("<body><#:js path=\"a.js\" selector=\"bodyend\" /></body>")
		.assert()
		.success()
		.stdout("<body><script type=\"text/javascript\" src=\"a.js\"></script></body>");

	Ok(())
}

#[test]
fn invalid_config_is_reported() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("tagsmith.toml"), "flavor = \"pdf\"\n")?;

	common::tagsmith_cmd()
		.args(["render", "-"])
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("text")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to parse config file"));

	Ok(())
}

#[test]
fn invalid_config_selector_is_reported() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("tagsmith.toml"),
		"[selectors]\nbroken = \"after:/(/\"\n",
	)?;

	common::tagsmith_cmd()
		.args(["render", "-"])
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("text")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("selector `after:/(/` is invalid"));

	Ok(())
}
