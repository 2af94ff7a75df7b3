// src/exec/command_line.rs

//! Splitting a raw command line into argv.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

// A token is either a run of characters that are neither whitespace nor
// quotes, or a complete "..." / '...' span (quotes stripped).
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[^\s"']+|"([^"]*)"|'([^']*)'"#).expect("token regex is valid")
});

/// Split `command_line` into argv.
///
/// Quoted spans keep their embedded whitespace and become one token each.
/// An unterminated quote is dropped, and a quote glued to a bare word
/// (`a"b c"`) splits it into `a` and `b c`.
pub fn parse_command_line(command_line: &str) -> Vec<String> {
    TOKEN_RE
        .captures_iter(command_line)
        .filter_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().to_string())
        })
        .collect()
}

/// Directory the process is started in: the one containing the program.
///
/// Bare program names (`echo`) have no parent and inherit the agent's
/// working directory.
pub fn working_dir_for(program: &str) -> Option<PathBuf> {
    Path::new(program)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
}
