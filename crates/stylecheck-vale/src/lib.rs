#![warn(missing_docs)]
//! `stylecheck-vale` - Vale integration for `stylecheck-core`.
//!
//! This crate owns everything that touches the `vale` executable:
//!
//! - [`ValeRunner`] implements [`stylecheck_core::Linter`]: it spawns `vale`, writes the text to
//!   stdin and decodes the file-keyed JSON report.
//! - [`ValeConfigurator`] renders `.vale.ini` from [`stylecheck_core::Settings`], writes it and
//!   runs `vale sync` so the configured packages are downloaded.
//!
//! The core crate stays process-free; hosts pick a runtime and hand a runner to the detector.
//!
//! ```no_run
//! use stylecheck_core::{Detector, Settings, TextDocument, Trigger};
//! use stylecheck_vale::{ValeConfig, ValeRunner};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::default();
//! let runner = ValeRunner::new(ValeConfig::from_settings(&settings));
//! let mut detector = Detector::new(runner, settings);
//! let mut doc = TextDocument::new("This is very good.");
//! let outcome = detector.run(&mut doc, Trigger::Command).await?;
//! println!("{} annotations", outcome.added.len());
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod configurator;
pub mod ini;
pub mod output;
pub mod runner;

pub use command::{EXTRA_SEARCH_PATH, augmented_path, vale_command};
pub use configurator::{ConfigSyncError, ValeConfig, ValeConfigurator};
pub use ini::{ValeIni, safe};
pub use output::{interpret_exit, parse_report};
pub use runner::ValeRunner;
