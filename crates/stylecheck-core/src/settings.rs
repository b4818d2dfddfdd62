//! Persisted user settings.
//!
//! Settings are owned by the host and injected into the detector; the detector re-reads the
//! severity floor and suppressed rules at the start of every cycle. The JSON shape is the one the
//! host persists (camelCase keys, every key optional, missing keys take the defaults below).

use crate::issue::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file location relative to the host's configuration directory.
pub const DEFAULT_CONFIG_SUBPATH: [&str; 4] = ["plugins", "obsidian-writing-style", "data", ".vale.ini"];

/// Settings loading and resolution errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unsupported platform: cannot resolve an absolute config path for '{0}'")]
    /// The host has no file-system configuration directory to resolve against.
    UnsupportedPlatform(PathBuf),

    #[error("failed to read or write settings at {path}: {source}")]
    /// Settings file I/O failed.
    Io {
        /// Settings file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings JSON: {0}")]
    /// Settings JSON could not be parsed or produced.
    Json(#[from] serde_json::Error),
}

/// Base style package every configuration builds on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BaseStyle {
    /// Google developer documentation style.
    #[default]
    Google,
    /// Microsoft Writing Style Guide.
    Microsoft,
    /// Red Hat supplementary style guide.
    RedHat,
}

impl BaseStyle {
    /// Package name as the linter knows it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Microsoft => "Microsoft",
            Self::RedHat => "RedHat",
        }
    }
}

/// Optional style packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Package {
    /// Insensitive, inconsiderate writing.
    #[serde(rename = "alex")]
    Alex,
    /// Checks inspired by proselint.
    #[serde(rename = "proselint")]
    Proselint,
    /// Passive voice, weasel words, cliches.
    #[serde(rename = "write-good")]
    WriteGood,
    /// Job posting issues.
    Joblint,
    /// Hugo shortcodes and markup.
    Hugo,
}

impl Package {
    /// Package name as the linter knows it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alex => "alex",
            Self::Proselint => "proselint",
            Self::WriteGood => "write-good",
            Self::Joblint => "Joblint",
            Self::Hugo => "Hugo",
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Regenerate and sync the linter configuration on the next save.
    pub save_vale_config: bool,
    /// Check edited lines automatically after a quiet period.
    pub should_auto_check: bool,
    /// Base style.
    pub base_style: BaseStyle,
    /// Enabled optional packages.
    pub enabled_packages: Vec<Package>,
    /// Minimum severity to report.
    pub min_alert_level: Severity,
    /// Suppressed rule identifiers.
    pub ignore_rules: Vec<String>,
    /// Linter executable. Empty until resolved.
    pub vale_path: PathBuf,
    /// Linter config file. Empty until resolved.
    pub config_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            save_vale_config: true,
            should_auto_check: false,
            base_style: BaseStyle::Google,
            enabled_packages: vec![Package::WriteGood, Package::Alex],
            min_alert_level: Severity::Suggestion,
            ignore_rules: vec![
                "Google.Exclamation".to_string(),
                "Google.We".to_string(),
                "write-good.E-Prime".to_string(),
            ],
            vale_path: PathBuf::new(),
            config_path: PathBuf::new(),
        }
    }
}

impl Settings {
    /// Parse persisted settings; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize for persistence.
    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Write settings to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_json()?).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fill in empty paths.
    ///
    /// An empty linter path becomes the platform executable name. An empty config path becomes
    /// the default location under `host_config_dir`; a relative one is joined onto it. Without a
    /// host config directory only absolute config paths can be used.
    pub fn resolve_paths(&mut self, host_config_dir: Option<&Path>) -> Result<(), SettingsError> {
        if self.vale_path.as_os_str().is_empty() {
            self.vale_path = PathBuf::from(if cfg!(windows) { "vale.exe" } else { "vale" });
        }

        if self.config_path.as_os_str().is_empty() {
            self.config_path = DEFAULT_CONFIG_SUBPATH.iter().collect();
        }
        if self.config_path.is_relative() {
            let Some(dir) = host_config_dir else {
                return Err(SettingsError::UnsupportedPlatform(self.config_path.clone()));
            };
            self.config_path = dir.join(&self.config_path);
        }
        Ok(())
    }

    /// Base style followed by enabled packages, as linter package names.
    pub fn style_names(&self) -> Vec<&'static str> {
        std::iter::once(self.base_style.as_str())
            .chain(self.enabled_packages.iter().map(|p| p.as_str()))
            .collect()
    }

    /// Whether a rule identifier is suppressed.
    pub fn is_rule_ignored(&self, check: &str) -> bool {
        self.ignore_rules.iter().any(|rule| rule == check)
    }

    /// Flip automatic checking, returning the new state.
    pub fn toggle_auto_check(&mut self) -> bool {
        self.should_auto_check = !self.should_auto_check;
        self.should_auto_check
    }
}
