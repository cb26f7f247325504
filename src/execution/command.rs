//! Classification of raw command lines.

use std::path::{Path, PathBuf};

/// A command line, classified by how the executor must handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand<'a> {
    /// Bare `cd`: go to the session's home directory.
    ChangeDirHome,
    /// `cd <target>`: `target` is the raw remainder of the first line.
    ChangeDir { target: &'a str },
    /// Anything else runs in a subprocess.
    Other(&'a str),
}

impl<'a> ShellCommand<'a> {
    /// Classify a raw command line.
    ///
    /// `cd` must be the first word: `cdx` or `echo; cd /` are ordinary
    /// commands. Only the first line after `cd` is taken as the target.
    pub fn parse(command_line: &'a str) -> Self {
        let Some(rest) = command_line.trim_start().strip_prefix("cd") else {
            return Self::Other(command_line);
        };

        if rest.trim().is_empty() {
            return Self::ChangeDirHome;
        }

        if !rest.starts_with(char::is_whitespace) {
            return Self::Other(command_line);
        }

        let remainder = rest.trim_start();
        let target = remainder
            .split_once('\n')
            .map_or(remainder, |(line, _)| line);

        Self::ChangeDir { target }
    }

    /// Whether this command is handled without spawning a process.
    pub fn is_builtin(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// Resolve a `cd` target against the session's home and working directory.
///
/// The result is not canonicalized; `.` and `..` are left for the
/// filesystem to resolve.
pub fn resolve_target(target: &str, home: &str, cwd: &Path) -> PathBuf {
    let target = target.trim();

    if target == "~" {
        PathBuf::from(home)
    } else if let Some(rest) = target.strip_prefix("~/") {
        PathBuf::from(format!("{home}/{rest}"))
    } else if !target.starts_with('/') {
        cwd.join(target)
    } else {
        PathBuf::from(target)
    }
}

/// Error text reported when a `cd` target cannot be entered.
pub fn missing_directory_message(target: &str) -> String {
    format!("cd: {target}: No such file or directory\n")
}
