//! `blmctl daemon status` against a state dir with no daemon running.

use crate::prelude::*;

#[test]
fn status_reports_not_running_when_no_daemon_is_up() {
    let state_dir = tempfile::tempdir().unwrap();
    blmctl()
        .env("BLM_STATE_DIR", state_dir.path().to_str().unwrap())
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Daemon not running");
}

#[test]
fn status_as_json_reports_not_running() {
    let state_dir = tempfile::tempdir().unwrap();
    blmctl()
        .env("BLM_STATE_DIR", state_dir.path().to_str().unwrap())
        .args(&["--format", "json", "daemon", "status"])
        .passes()
        .stdout_has("not_running");
}
