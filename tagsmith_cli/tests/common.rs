use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn tagsmith_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("tagsmith"));
	cmd.env("NO_COLOR", "1").env_remove("TAGSMITH_LOG");
	cmd
}
