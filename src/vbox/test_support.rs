// file: src/vbox/test_support.rs
// version: 1.1.0
// guid: b85e2d70-3a1c-4f98-9c64-d2e01a7b3f56

//! A shell script standing in for VBoxManage in tests.
//!
//! Shared by the unit tests and, through `#[path]`, by `tests/common`, so it
//! only depends on std and tempfile.
//!
//! Every invocation appends its arguments to `calls.log`. For sub-command
//! `X` the script prints `X.out` and exits with the code in `X.code` when
//! those files exist. `X.once` holds an exit code used for the next call
//! only, before any output.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub(crate) struct FakeVBoxManage {
    dir: TempDir,
}

impl FakeVBoxManage {
    pub(crate) fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let script = format!(
            r#"#!/bin/sh
dir='{}'
printf '%s\n' "$*" >> "$dir/calls.log"
if [ -f "$dir/$1.once" ]; then code="$(cat "$dir/$1.once")"; rm -f "$dir/$1.once"; exit "$code"; fi
if [ -f "$dir/$1.out" ]; then cat "$dir/$1.out"; fi
if [ -f "$dir/$1.code" ]; then exit "$(cat "$dir/$1.code")"; fi
exit 0
"#,
            dir.path().display()
        );

        let path = dir.path().join("VBoxManage");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let fake = Self { dir };
        fake.set_output("-v", "7.0.14r161095\n");
        fake
    }

    pub(crate) fn path(&self) -> PathBuf {
        self.dir.path().join("VBoxManage")
    }

    pub(crate) fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn set_output(&self, subcommand: &str, output: &str) {
        std::fs::write(self.dir.path().join(format!("{}.out", subcommand)), output).unwrap();
    }

    pub(crate) fn set_exit_code(&self, subcommand: &str, code: i32) {
        std::fs::write(
            self.dir.path().join(format!("{}.code", subcommand)),
            code.to_string(),
        )
        .unwrap();
    }

    pub(crate) fn set_exit_code_once(&self, subcommand: &str, code: i32) {
        std::fs::write(
            self.dir.path().join(format!("{}.once", subcommand)),
            code.to_string(),
        )
        .unwrap();
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}
