//! `.vale.ini` rendering.

use stylecheck_core::Severity;

/// Styles directory written when nothing else is configured, relative to the ini file.
pub const DEFAULT_STYLES_PATH: &str = "styles";

/// The subset of `.vale.ini` this crate manages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValeIni {
    /// `StylesPath`.
    pub styles_path: String,
    /// `MinAlertLevel`.
    pub min_alert_level: Severity,
    /// `Packages`, written comma-joined.
    pub packages: Vec<String>,
    /// `BasedOnStyles` under the `[*]` section.
    pub based_on_styles: Vec<String>,
}

impl Default for ValeIni {
    fn default() -> Self {
        let styles = vec!["Google".to_string(), "write-good".to_string()];
        Self {
            styles_path: DEFAULT_STYLES_PATH.to_string(),
            min_alert_level: Severity::Suggestion,
            packages: styles.clone(),
            based_on_styles: styles,
        }
    }
}

impl ValeIni {
    /// Render as ini text: global keys, a blank line, then the `[*]` section.
    pub fn render(&self) -> String {
        let mut out = String::new();
        push_key(&mut out, "StylesPath", &self.styles_path);
        push_key(&mut out, "MinAlertLevel", self.min_alert_level.as_str());
        push_key(&mut out, "Packages", &join(&self.packages));
        out.push('\n');
        out.push_str(&format!("[{}]\n", safe("*")));
        push_key(&mut out, "BasedOnStyles", &join(&self.based_on_styles));
        out
    }
}

fn join(values: &[String]) -> String {
    values.iter().map(|v| safe(v)).collect::<Vec<_>>().join(", ")
}

fn push_key(out: &mut String, key: &str, value: &str) {
    out.push_str(&safe(key));
    out.push('=');
    out.push_str(&safe(value));
    out.push('\n');
}

/// Escape an ini key or value.
///
/// Values an ini reader would misparse (containing `=` or line breaks, starting with `[`, already
/// quoted, or with surrounding whitespace) are written as JSON strings. Otherwise `;` and `#` are
/// backslash-escaped so they are not read as comments.
pub fn safe(value: &str) -> String {
    if value.contains(['=', '\r', '\n'])
        || value.starts_with('[')
        || is_quoted(value)
        || value != value.trim()
    {
        return serde_json::Value::String(value.to_string()).to_string();
    }
    value.replace(';', "\\;").replace('#', "\\#")
}

fn is_quoted(value: &str) -> bool {
    value.len() > 1
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
}
