//! Build script for pana-scores: embeds version information for `--version`.
//!
//! The version string is `{CARGO_PKG_VERSION} ({revision}) {rustc}` where
//! `revision` is `git describe --tags --always --dirty` when run from a
//! checkout. Components that cannot be determined are left out.

use std::{env, process::Command};

fn main() {
    ["src", "build.rs", "Cargo.toml"]
        .iter()
        .for_each(|path| println!("cargo:rerun-if-changed={path}"));

    println!("cargo:rustc-env=BUILD_INFO_HUMAN={}", build_info());
}

/// Runs `program` and returns its trimmed stdout when it succeeds.
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn build_info() -> String {
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());

    [
        Some(env!("CARGO_PKG_VERSION").to_string()),
        command_output("git", &["describe", "--tags", "--always", "--dirty"])
            .map(|rev| format!("({rev})")),
        command_output(&rustc, &["--version"]),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
}
