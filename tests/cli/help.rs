//! `blmctl --help`/subcommand help text.

use crate::prelude::*;

#[test]
fn no_args_shows_usage_and_exits_nonzero() {
    blmctl().fails().stderr_has("Usage:");
}

#[test]
fn help_shows_usage() {
    blmctl().args(&["--help"]).passes().stdout_has("Usage:");
}

#[test]
fn daemon_help_shows_subcommands() {
    blmctl()
        .args(&["daemon", "--help"])
        .passes()
        .stdout_has("start")
        .stdout_has("stop")
        .stdout_has("status");
}

#[test]
fn meetings_help_shows_subcommands() {
    blmctl()
        .args(&["meetings", "--help"])
        .passes()
        .stdout_has("list")
        .stdout_has("get");
}
