//! Linter findings.
//!
//! An [`Issue`] is one finding exactly as the external prose linter reported it: a 1-based line
//! number and a column span relative to the text that was submitted, not to the document. Issues
//! are immutable once received; the annotation store shares them behind `Arc`.
//!
//! Field names follow the linter's JSON output (`Check`, `Span`, `Match`, ...), so a result
//! array deserializes straight into `Vec<Issue>`.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of replacement candidates surfaced for one issue.
pub const MAX_REPLACEMENTS: usize = 3;

/// Issue severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Style suggestions.
    #[default]
    Suggestion,
    /// Warnings.
    Warning,
    /// Errors.
    Error,
}

impl Severity {
    /// The lowercase name used in linter output and configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Suggestion => "suggestion",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Presentation class a host can map to an underline style.
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Suggestion => "sc-style",
            Self::Warning => "sc-minor",
            Self::Error => "sc-major",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "suggestion" => Ok(Self::Suggestion),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// The linter's suggested fix.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IssueAction {
    /// Action kind (`replace`, `remove`, `suggest`, ... or empty).
    #[serde(default)]
    pub name: String,
    /// Ordered action parameters. For `replace` these are candidate replacement strings.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub params: Vec<String>,
}

/// A single linter finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Issue {
    /// Suggested fix.
    #[serde(default)]
    pub action: IssueAction,
    /// `[start, end]` columns on `line`: start is 1-based, end is inclusive.
    pub span: [usize; 2],
    /// Optional extra offsets reported by some rules.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub offset: Vec<String>,
    /// Rule identifier, e.g. `write-good.Weasel`.
    pub check: String,
    /// Long-form rule description.
    #[serde(default)]
    pub description: String,
    /// External reference link (empty when absent).
    #[serde(default)]
    pub link: String,
    /// Human-readable message.
    pub message: String,
    /// Severity.
    pub severity: Severity,
    /// Exact matched substring.
    #[serde(rename = "Match", default)]
    pub matched: String,
    /// 1-based line in the submitted text.
    pub line: usize,
}

impl Issue {
    /// External reference link, if any.
    pub fn link(&self) -> Option<&str> {
        let link = self.link.trim();
        (!link.is_empty()).then_some(link)
    }

    /// Up to [`MAX_REPLACEMENTS`] candidate replacements, skipping blank ones.
    ///
    /// Only `replace` actions carry literal replacement text.
    pub fn replacements(&self) -> Vec<&str> {
        if self.action.name != "replace" {
            return Vec::new();
        }
        self.action
            .params
            .iter()
            .take(MAX_REPLACEMENTS)
            .map(String::as_str)
            .filter(|p| !p.trim().is_empty())
            .collect()
    }

    /// Rule name without its style prefix (`Spelling` for `Vale.Spelling`).
    pub fn rule_name(&self) -> &str {
        self.check
            .rsplit_once('.')
            .map_or(self.check.as_str(), |(_, rule)| rule)
    }

    /// Whether this is a spelling-class finding that can be added to the personal dictionary.
    pub fn is_spelling(&self) -> bool {
        self.check == "TYPOS" || self.rule_name() == "Spelling"
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
