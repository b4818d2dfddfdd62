//! Decoding `vale --output JSON`.
//!
//! Vale reports `{ "<file>": [alert, ...], ... }`. Text piped on stdin is reported under a
//! synthetic file name, so the keys carry no information; the alert lists are concatenated in
//! the order Vale emitted them (`serde_json` is built with `preserve_order`).

use serde_json::{Map, Value};
use stylecheck_core::{Issue, LintError};

/// Concatenate every file's alerts from a JSON report.
pub fn parse_report(stdout: &[u8]) -> Result<Vec<Issue>, serde_json::Error> {
    let files: Map<String, Value> = serde_json::from_slice(stdout)?;
    let mut issues = Vec::new();
    for (_, alerts) in files {
        let alerts: Vec<Issue> = serde_json::from_value(alerts)?;
        issues.extend(alerts);
    }
    Ok(issues)
}

/// Turn a finished `vale` run into issues.
///
/// Exit code 0 means nothing was found, 1 means `stdout` holds a report. Anything else (including
/// termination by a signal) is a failure.
pub fn interpret_exit(code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> Result<Vec<Issue>, LintError> {
    match code {
        Some(0) => Ok(Vec::new()),
        Some(1) => Ok(parse_report(stdout)?),
        code => Err(LintError::UnexpectedExit {
            code,
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }),
    }
}
