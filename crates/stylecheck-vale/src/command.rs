//! Building `vale` invocations.

use std::ffi::{OsStr, OsString};
use std::path::Path;
use tokio::process::Command;

/// Directory appended to the child's `PATH` (Homebrew on Apple silicon).
pub const EXTRA_SEARCH_PATH: &str = "/opt/homebrew/bin";

#[cfg(windows)]
const PATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const PATH_SEPARATOR: &str = ":";

/// `current` with [`EXTRA_SEARCH_PATH`] appended.
pub fn augmented_path(current: Option<&OsStr>) -> OsString {
    let mut path = OsString::new();
    if let Some(current) = current.filter(|p| !p.is_empty()) {
        path.push(current);
        path.push(PATH_SEPARATOR);
    }
    path.push(EXTRA_SEARCH_PATH);
    path
}

/// A command for `program` with the augmented search path and the given arguments.
///
/// Standard streams are left at their defaults; callers pipe what they need.
pub fn vale_command<I, S>(program: &Path, args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args)
        .env("PATH", augmented_path(std::env::var_os("PATH").as_deref()))
        .kill_on_drop(true);
    cmd
}
