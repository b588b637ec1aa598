// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin wrapper over `assert_cmd` so individual specs read as a chain of
//! assertions rather than repeating `Command::cargo_bin`/`.assert()` noise.

use assert_cmd::Command;

pub fn blmctl() -> Invocation {
    Invocation { cmd: Command::cargo_bin("blmctl").expect("blmctl binary not built") }
}

pub struct Invocation {
    cmd: Command,
}

impl Invocation {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    /// Runs the command and asserts it exited successfully, returning the
    /// captured stdout/stderr for further assertions.
    pub fn passes(mut self) -> Output {
        let assert = self.cmd.assert().success();
        Output { output: assert.get_output().clone() }
    }

    /// Runs the command and asserts it exited non-zero.
    pub fn fails(mut self) -> Output {
        let assert = self.cmd.assert().failure();
        Output { output: assert.get_output().clone() }
    }
}

pub struct Output {
    output: std::process::Output,
}

impl Output {
    pub fn stdout_has(self, needle: &str) -> Self {
        let stdout = String::from_utf8_lossy(&self.output.stdout);
        assert!(stdout.contains(needle), "expected stdout to contain {needle:?}, got:\n{stdout}");
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let stderr = String::from_utf8_lossy(&self.output.stderr);
        assert!(stderr.contains(needle), "expected stderr to contain {needle:?}, got:\n{stderr}");
        self
    }
}
