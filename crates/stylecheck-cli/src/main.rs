//! Headless stylecheck host.
//!
//! Loads a Markdown file into a [`TextDocument`], runs one detection cycle through `vale` and
//! prints every resulting annotation as `file:line:col: severity [check] message`.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p stylecheck-cli -- <file.md> [settings.json]
//! ```
//!
//! Settings default to the built-in values when the JSON file is missing. Relative or empty
//! `valePath`/`configPath` values are resolved against the configuration directory:
//!
//! - `STYLECHECK_CONFIG_DIR`: configuration directory (default `./.stylecheck`)
//! - `RUST_LOG`: log filter (default `warn`), logs go to stderr
//!
//! A `dictionary.json` (`{"terms": [...]}`) in the configuration directory seeds the personal
//! dictionary. When `saveValeConfig` is set the `.vale.ini` is regenerated and synced first; a
//! failed sync is logged and checking continues.
//!
//! Exit status is 0 when no annotation was produced, 1 when some were, 2 on error.

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use stylecheck_core::{
    Annotation, Detector, DictionaryFile, Document, Ledger, Settings, TextDocument, Trigger,
};
use stylecheck_vale::{ValeConfig, ValeConfigurator, ValeRunner};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_DIR_VAR: &str = "STYLECHECK_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = ".stylecheck";
const DICTIONARY_FILE: &str = "dictionary.json";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        let program = args.first().map_or("stylecheck", String::as_str);
        eprintln!("usage: {program} <file.md> [settings.json]");
        return ExitCode::from(2);
    }

    match run(Path::new(&args[1]), args.get(2).map(PathBuf::from)).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(err) => {
            error!("{err}");
            ExitCode::from(2)
        }
    }
}

async fn run(
    file: &Path,
    settings_path: Option<PathBuf>,
) -> Result<usize, Box<dyn std::error::Error>> {
    let config_dir = env::var_os(CONFIG_DIR_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR));
    let config_dir = std::path::absolute(&config_dir)?;

    let mut settings = match &settings_path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    settings.resolve_paths(Some(&config_dir))?;
    debug!(vale = %settings.vale_path.display(), config = %settings.config_path.display(), "resolved paths");

    let vale = ValeConfig::from_settings(&settings);
    if settings.save_vale_config {
        match ValeConfigurator::new(vale.clone()).apply_settings(&settings).await {
            Ok(()) => {
                settings.save_vale_config = false;
                if let Some(path) = &settings_path {
                    settings.save(path)?;
                }
            }
            Err(err) => warn!("vale config sync failed: {err}"),
        }
    }

    let ledger = load_ledger(&config_dir.join(DICTIONARY_FILE))?;
    let text = std::fs::read_to_string(file)?;
    let mut doc = TextDocument::new(&text);
    let mut detector = Detector::with_ledger(ValeRunner::new(vale), settings, ledger);
    detector.subscribe_status(|status| debug!(?status, "detector status"));

    let outcome = detector.run(&mut doc, Trigger::Command).await?;
    info!(
        added = outcome.added.len(),
        skipped = outcome.skipped.total(),
        "check finished"
    );

    let annotations = detector.store().annotations();
    for annotation in &annotations {
        println!("{}", describe(file, &doc, annotation));
    }
    Ok(annotations.len())
}

fn load_ledger(path: &Path) -> Result<Ledger, Box<dyn std::error::Error>> {
    let mut ledger = Ledger::new();
    match std::fs::read_to_string(path) {
        Ok(json) => {
            let file: DictionaryFile = serde_json::from_str(&json)?;
            ledger.load_dictionary(file);
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }
    Ok(ledger)
}

fn describe(file: &Path, doc: &TextDocument, annotation: &Annotation) -> String {
    let line = doc.line_of(annotation.from);
    let column = doc
        .line_range(line)
        .map_or(0, |range| annotation.from.saturating_sub(range.start));
    let issue = &annotation.issue;
    format!(
        "{}:{}:{}: {} [{}] {}",
        file.display(),
        line + 1,
        column + 1,
        issue.severity.as_str(),
        issue.check,
        issue.message
    )
}
