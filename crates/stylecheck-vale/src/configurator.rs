//! Writing `.vale.ini` and running `vale sync`.

use crate::command::vale_command;
use crate::ini::ValeIni;
use std::path::PathBuf;
use std::process::Stdio;
use stylecheck_core::Settings;
use thiserror::Error;
use tracing::{debug, info};

/// Where the executable and its config file live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValeConfig {
    /// `vale` executable (bare names are looked up on `PATH`).
    pub vale_path: PathBuf,
    /// `.vale.ini` path.
    pub config_path: PathBuf,
}

impl ValeConfig {
    /// Create a config from explicit paths.
    pub fn new(vale_path: impl Into<PathBuf>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            vale_path: vale_path.into(),
            config_path: config_path.into(),
        }
    }

    /// Take both paths from settings. Call [`Settings::resolve_paths`] first.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.vale_path.clone(), settings.config_path.clone())
    }
}

/// Errors while regenerating or syncing the Vale configuration.
#[derive(Debug, Error)]
pub enum ConfigSyncError {
    #[error("failed to create config directory {path}: {source}")]
    /// The config file's parent directory could not be created.
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    /// The config file could not be written.
    Write {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn '{program}': {source}")]
    /// `vale sync` could not be started.
    Spawn {
        /// Program that was launched.
        program: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    #[error("vale sync exited with {}: {stderr}", exit_label(.code))]
    /// `vale sync` exited non-zero.
    UnexpectedExit {
        /// Exit code, or `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },
}

/// Regenerates `.vale.ini` from settings and downloads the configured packages.
#[derive(Debug, Clone)]
pub struct ValeConfigurator {
    config: ValeConfig,
}

impl ValeConfigurator {
    /// Create a configurator for `config`.
    pub fn new(config: ValeConfig) -> Self {
        Self { config }
    }

    /// Executable and config paths in use.
    pub fn config(&self) -> &ValeConfig {
        &self.config
    }

    /// The ini document for `settings`: base style first, then enabled packages, used for both
    /// `Packages` and `BasedOnStyles`.
    pub fn ini_from_settings(settings: &Settings) -> ValeIni {
        let styles: Vec<String> = settings.style_names().into_iter().map(str::to_string).collect();
        ValeIni {
            min_alert_level: settings.min_alert_level,
            packages: styles.clone(),
            based_on_styles: styles,
            ..ValeIni::default()
        }
    }

    /// Write `ini` to the config path, creating parent directories.
    pub fn save(&self, ini: &ValeIni) -> Result<(), ConfigSyncError> {
        let path = &self.config.config_path;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| ConfigSyncError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, ini.render()).map_err(|source| ConfigSyncError::Write {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "wrote vale config");
        Ok(())
    }

    /// Run `vale --config <path> sync`.
    pub async fn sync(&self) -> Result<(), ConfigSyncError> {
        let mut cmd = vale_command(&self.config.vale_path, ["--config"]);
        cmd.arg(&self.config.config_path)
            .arg("sync")
            .stdin(Stdio::null());
        let output = cmd.output().await.map_err(|source| ConfigSyncError::Spawn {
            program: self.config.vale_path.display().to_string(),
            source,
        })?;
        if !output.status.success() {
            return Err(ConfigSyncError::UnexpectedExit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    /// Render, save and sync in one step.
    pub async fn apply_settings(&self, settings: &Settings) -> Result<(), ConfigSyncError> {
        self.save(&Self::ini_from_settings(settings))?;
        self.sync().await?;
        info!(config = %self.config.config_path.display(), "vale config synced");
        Ok(())
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}
