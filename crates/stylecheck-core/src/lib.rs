#![warn(missing_docs)]
//! Stylecheck Core - Headless Annotation Engine for Prose Linters
//!
//! # Overview
//!
//! `stylecheck-core` sits between a host text editor and an external prose linter. It sends
//! document text to the linter, maps the returned line/column findings onto the live buffer, and
//! keeps the resulting annotations anchored while the user keeps typing. It never renders
//! anything and never spawns processes itself: the host supplies a [`Document`] and a [`Linter`].
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Interaction (popup lookup + user actions)  │  ← Host gestures
//! ├─────────────────────────────────────────────┤
//! │  Detector (cycles, cache, stale responses)  │  ← Orchestration
//! ├─────────────────────────────────────────────┤
//! │  Annotation Store + Ledger + Auto-check     │  ← Position-tracked state
//! ├─────────────────────────────────────────────┤
//! │  Interval Set + Document Changes            │  ← Re-anchoring
//! ├─────────────────────────────────────────────┤
//! │  Document capability (rope / line-column)   │  ← Host buffer
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use std::future::Future;
//! use stylecheck_core::{
//!     CycleStart, Detector, Issue, LintError, Linter, Settings, TextDocument, Trigger,
//! };
//!
//! struct Silent;
//!
//! impl Linter for Silent {
//!     fn lint(&self, _text: &str) -> impl Future<Output = Result<Vec<Issue>, LintError>> + Send {
//!         std::future::ready(Ok(Vec::new()))
//!     }
//! }
//!
//! let doc = TextDocument::new("This is very good.");
//! let mut detector = Detector::new(Silent, Settings::default());
//!
//! let issue: Issue = serde_json::from_str(
//!     r#"{"Span": [9, 17], "Check": "write-good.TooWordy", "Message": "'very good' is too wordy.",
//!         "Severity": "suggestion", "Match": "very good", "Line": 1}"#,
//! )?;
//!
//! if let CycleStart::Lint(request) = detector.begin(&doc, Trigger::Command)? {
//!     let outcome = detector.complete(&doc, request, Ok(vec![issue]))?;
//!     assert_eq!(outcome.added.len(), 1);
//! }
//! assert_eq!(detector.store().annotations()[0].range(), 8..17);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Description
//!
//! - [`span`] - linter line/column spans to document offsets
//! - [`cache`] - fingerprint-keyed LRU of linter results
//! - [`store`] - live annotations
//! - [`ledger`] - ignored ranges and the personal dictionary
//! - [`detector`] - detection cycles
//! - [`interaction`] - popups and user actions
//! - [`document`] / [`line_column`] - document capability and its adapters
//! - [`auto_check`] - debounced dirty-line queue
//! - [`settings`] - persisted user settings
//!
//! All offsets are character offsets (Unicode scalar values).

pub mod auto_check;
pub mod cache;
pub mod change;
pub mod classify;
pub mod detector;
pub mod document;
pub mod interaction;
pub mod intervals;
pub mod issue;
pub mod ledger;
pub mod line_column;
pub mod linter;
pub mod settings;
pub mod span;
pub mod store;

pub use auto_check::{AutoCheckQueue, DEFAULT_QUIET_PERIOD};
pub use cache::{DEFAULT_CACHE_CAPACITY, Fingerprint, ResultCache};
pub use change::{DocumentChange, EditOrigin};
pub use classify::{Exclusions, ProseClassifier};
pub use detector::{
    CycleId, CycleStart, DetectError, DetectionOutcome, DetectionRequest, DetectionStatus,
    Detector, OutcomeSource, SkipCounts, StatusCallback, Trigger,
};
pub use document::{Document, DocumentError, TextDocument};
pub use interaction::{
    ActionOutcome, AnnotationPopup, DismissAction, InteractionError, UserAction,
};
pub use intervals::{Entry, IntervalSet};
pub use issue::{Issue, IssueAction, MAX_REPLACEMENTS, Severity};
pub use ledger::{DictionaryFile, Ledger};
pub use line_column::{LineCol, LineColumnAdapter, LineColumnChange, LineColumnHost};
pub use linter::{LintError, Linter};
pub use settings::{BaseStyle, Package, Settings, SettingsError};
pub use span::{LineOffsets, MappingError};
pub use store::{Annotation, AnnotationId, AnnotationStore};
