//! Detection orchestration.
//!
//! A [`Detector`] owns everything that outlives a single check for one document: the result
//! cache, the annotation store, the ledger, the auto-check queue and the settings. A cycle runs
//! in two halves so hosts can keep editing while the linter works:
//!
//! 1. [`Detector::begin`] picks the target text, consults the cache and either finishes at once
//!    or hands back a [`DetectionRequest`] for the linter;
//! 2. [`Detector::complete`] takes the linter result, discards it if the document moved under
//!    it, and reconciles the surviving issues into the store.
//!
//! Between the two halves every document change must be fed through
//! [`Detector::sync_changes`] (or [`Detector::on_change`]) so in-flight target ranges stay
//! anchored. [`Detector::run`] chains both halves for hosts that do not edit while waiting.
//!
//! Status observers see `Working` when a cycle starts and `Ready` once no cycle is in flight.
//!
//! A cycle may be abandoned instead of completed: call [`Detector::abandon`], or just drop the
//! request. Superseded and abandoned flights are pruned when the next cycle begins, and a
//! cancelled [`Detector::run`] removes its own flight.

use crate::auto_check::AutoCheckQueue;
use crate::cache::{Fingerprint, ResultCache};
use crate::change::DocumentChange;
use crate::document::Document;
use crate::issue::Issue;
use crate::ledger::Ledger;
use crate::linter::{LintError, Linter};
use crate::settings::Settings;
use crate::span::{LineOffsets, MappingError};
use crate::store::{AnnotationId, AnnotationStore};
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that abort a detection cycle. Annotations outside the cycle's range are untouched.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("lint failed: {0}")]
    /// The linter could not be run or its output could not be read.
    Lint(#[from] LintError),

    #[error("target range {start}..{end} is not inside the document (length {len})")]
    /// An explicit target range was empty or out of bounds.
    InvalidRange {
        /// Range start.
        start: usize,
        /// Range end.
        end: usize,
        /// Document length.
        len: usize,
    },

    #[error("cycle {0:?} was never started")]
    /// [`Detector::complete`] was called with a cycle id this detector never issued.
    UnknownCycle(CycleId),
}

/// Detector activity, for a status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionStatus {
    /// A cycle is running.
    Working,
    /// Idle.
    Ready,
}

/// Status observer.
pub type StatusCallback = Box<dyn FnMut(DetectionStatus) + Send>;

/// Monotonic detection cycle id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CycleId(u64);

impl CycleId {
    /// Raw id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// What started a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Explicit "check document": the selection if there is one, else the whole document.
    Command,
    /// Debounced auto-check over the pending dirty lines.
    Auto,
    /// An explicit range.
    Range(Range<usize>),
}

/// Text handed to the linter for one cycle.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    /// Cycle id.
    pub cycle: CycleId,
    /// Exact text to lint.
    pub text: String,
    /// Document offset of `text` when the cycle began.
    pub base_offset: usize,
    /// Target range, or `None` for the whole document.
    pub range: Option<Range<usize>>,
    /// Fingerprint of `text`.
    pub fingerprint: Fingerprint,
}

/// Result of [`Detector::begin`].
#[derive(Debug)]
pub enum CycleStart {
    /// Nothing to check.
    Idle,
    /// Served from the cache; the store was not touched.
    Cached(DetectionOutcome),
    /// The linter must be run on the request's text.
    Lint(DetectionRequest),
}

/// Where a cycle's issues came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeSource {
    /// Nothing was checked.
    Nothing,
    /// Result cache.
    Cache,
    /// A fresh linter run.
    Linter,
}

/// Why issues were not turned into annotations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    /// Below the severity floor.
    pub below_floor: usize,
    /// Rule is suppressed.
    pub suppressed: usize,
    /// Span could not be mapped.
    pub unmapped: usize,
    /// Mapped outside the document.
    pub outside_document: usize,
    /// An annotation already covers exactly that range.
    pub duplicate: usize,
    /// The range was ignored by the user.
    pub ignored: usize,
    /// The matched text is in the dictionary.
    pub in_dictionary: usize,
    /// The range is not prose.
    pub not_checkable: usize,
}

impl SkipCounts {
    /// Total skipped issues.
    pub fn total(&self) -> usize {
        self.below_floor
            + self.suppressed
            + self.unmapped
            + self.outside_document
            + self.duplicate
            + self.ignored
            + self.in_dictionary
            + self.not_checkable
    }
}

/// Summary of one detection cycle.
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    /// Cycle id, `None` when nothing was checked.
    pub cycle: Option<CycleId>,
    /// Issue source.
    pub source: OutcomeSource,
    /// Every issue the linter reported for the target text.
    pub issues: Arc<[Issue]>,
    /// Annotations created by this cycle.
    pub added: Vec<AnnotationId>,
    /// Filter statistics.
    pub skipped: SkipCounts,
    /// The result arrived after the document moved under it and was dropped.
    pub discarded: bool,
}

impl DetectionOutcome {
    fn idle() -> Self {
        Self {
            cycle: None,
            source: OutcomeSource::Nothing,
            issues: Arc::from(Vec::new()),
            added: Vec::new(),
            skipped: SkipCounts::default(),
            discarded: false,
        }
    }
}

#[derive(Debug, Clone)]
struct InFlight {
    cycle: CycleId,
    /// Current-coordinate target range; `None` for whole-document cycles.
    range: Option<Range<usize>>,
    stale: bool,
}

impl InFlight {
    fn overlaps(&self, other: Option<&Range<usize>>) -> bool {
        match (&self.range, other) {
            (Some(a), Some(b)) => a.start <= b.end && b.start <= a.end,
            _ => true,
        }
    }

    fn apply_change(&mut self, change: &DocumentChange) {
        if self.stale {
            return;
        }
        let Some(range) = &self.range else {
            self.stale = true;
            return;
        };
        if change.modifies(range.start, range.end) {
            self.stale = true;
            return;
        }
        match change.map_range(range.start, range.end) {
            Some((start, end)) => self.range = Some(start..end),
            None => self.stale = true,
        }
    }
}

fn remove_flight(in_flight: &mut Vec<InFlight>, cycle: CycleId) -> Option<InFlight> {
    let idx = in_flight.iter().position(|f| f.cycle == cycle)?;
    Some(in_flight.remove(idx))
}

/// Current status plus the observers to notify on transitions.
struct StatusBoard {
    current: DetectionStatus,
    observers: Vec<StatusCallback>,
}

impl StatusBoard {
    fn set(&mut self, status: DetectionStatus) {
        if self.current == status {
            return;
        }
        self.current = status;
        for observer in &mut self.observers {
            observer(status);
        }
    }

    fn settle(&mut self, in_flight: &[InFlight]) {
        if in_flight.is_empty() {
            self.set(DetectionStatus::Ready);
        }
    }
}

/// Removes a [`Detector::run`] flight if the run is dropped while awaiting the linter.
struct FlightGuard<'a> {
    in_flight: &'a mut Vec<InFlight>,
    status: &'a mut StatusBoard,
    cycle: Option<CycleId>,
}

impl FlightGuard<'_> {
    fn disarm(mut self) {
        self.cycle = None;
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if let Some(cycle) = self.cycle.take() {
            if remove_flight(self.in_flight, cycle).is_some() {
                debug!(cycle = cycle.0, "run cancelled; flight removed");
            }
            self.status.settle(self.in_flight);
        }
    }
}

/// Detection engine for one document.
pub struct Detector<L> {
    pub(crate) linter: L,
    pub(crate) settings: Settings,
    pub(crate) cache: ResultCache,
    pub(crate) store: AnnotationStore,
    pub(crate) ledger: Ledger,
    pub(crate) auto_check: AutoCheckQueue,
    next_cycle: u64,
    in_flight: Vec<InFlight>,
    status: StatusBoard,
}

impl<L: Linter> Detector<L> {
    /// Create a detector with an empty ledger.
    pub fn new(linter: L, settings: Settings) -> Self {
        Self::with_ledger(linter, settings, Ledger::new())
    }

    /// Create a detector with an injected ledger.
    pub fn with_ledger(linter: L, settings: Settings, ledger: Ledger) -> Self {
        Self {
            linter,
            settings,
            cache: ResultCache::default(),
            store: AnnotationStore::new(),
            ledger,
            auto_check: AutoCheckQueue::default(),
            next_cycle: 0,
            in_flight: Vec::new(),
            status: StatusBoard {
                current: DetectionStatus::Ready,
                observers: Vec::new(),
            },
        }
    }

    /// Replace the auto-check queue (e.g. to change the quiet period).
    pub fn with_auto_check(mut self, queue: AutoCheckQueue) -> Self {
        self.auto_check = queue;
        self
    }

    /// The linter.
    pub fn linter(&self) -> &L {
        &self.linter
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable settings; changes apply from the next cycle.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Live annotations.
    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    /// The ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Mutable ledger, for hosts that edit the dictionary directly.
    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    /// The result cache.
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// The auto-check queue.
    pub fn auto_check(&self) -> &AutoCheckQueue {
        &self.auto_check
    }

    /// Current status.
    pub fn status(&self) -> DetectionStatus {
        self.status.current
    }

    /// Number of cycles waiting for the linter.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Subscribe to status transitions.
    pub fn subscribe_status<F>(&mut self, callback: F)
    where
        F: FnMut(DetectionStatus) + Send + 'static,
    {
        self.status.observers.push(Box::new(callback));
    }

    fn set_status(&mut self, status: DetectionStatus) {
        self.status.set(status);
    }

    fn settle_status(&mut self) {
        self.status.settle(&self.in_flight);
    }

    /// Give up on an in-flight cycle without applying anything.
    ///
    /// Returns `false` when the cycle was not in flight. Its result, if it still arrives, is
    /// reported as discarded by [`Detector::complete`].
    pub fn abandon(&mut self, cycle: CycleId) -> bool {
        let removed = remove_flight(&mut self.in_flight, cycle).is_some();
        if removed {
            debug!(cycle = cycle.0, "cycle abandoned");
        }
        self.settle_status();
        removed
    }

    /// Flip automatic checking. Turning it off drops pending work.
    pub fn toggle_auto_check(&mut self) -> bool {
        let enabled = self.settings.toggle_auto_check();
        if !enabled {
            self.auto_check.clear();
        }
        info!(enabled, "automatic checking toggled");
        enabled
    }

    /// Remove every annotation and forget cached results so the next check repopulates.
    pub fn clear_annotations(&mut self) -> usize {
        self.cache.clear();
        self.store.clear_all()
    }

    /// React to one document change, in order.
    ///
    /// Re-anchors the store, the ledger, pending auto-check ranges and in-flight targets, and
    /// queues user edits for automatic checking when it is enabled.
    pub fn on_change(&mut self, change: &DocumentChange, now: Instant) {
        self.store.apply_change(change);
        self.ledger.apply_change(change);
        self.auto_check.apply_change(change);
        for flight in &mut self.in_flight {
            flight.apply_change(change);
        }
        if self.settings.should_auto_check && change.origin.is_user_edit() {
            self.auto_check.record(change, now);
        }
    }

    /// Drain and apply the document's pending changes. Returns how many were applied.
    pub fn sync_changes<D: Document + ?Sized>(&mut self, doc: &mut D) -> usize {
        let changes = doc.take_changes();
        let now = Instant::now();
        for change in &changes {
            self.on_change(change, now);
        }
        changes.len()
    }

    /// Whether the auto-check quiet period has elapsed with work pending.
    pub fn auto_check_due(&self, now: Instant) -> bool {
        self.settings.should_auto_check && self.auto_check.is_due(now)
    }

    /// Start a cycle.
    ///
    /// Returns [`CycleStart::Cached`] when the target text was linted before: the cached issues
    /// are returned as-is and the store is left alone.
    pub fn begin<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        trigger: Trigger,
    ) -> Result<CycleStart, DetectError> {
        let range = match trigger {
            Trigger::Command => doc.selection(),
            Trigger::Range(range) => {
                let len = doc.len_chars();
                if range.start >= range.end || range.end > len {
                    return Err(DetectError::InvalidRange {
                        start: range.start,
                        end: range.end,
                        len,
                    });
                }
                Some(range)
            }
            Trigger::Auto => match self.auto_check.take_dirty_lines(doc) {
                Some(range) => Some(range),
                None => {
                    debug!("auto-check found no checkable dirty lines");
                    self.settle_status();
                    return Ok(CycleStart::Idle);
                }
            },
        };

        let (text, base_offset) = match &range {
            Some(range) => match doc.slice(range.clone()) {
                Some(text) => (text, range.start),
                None => {
                    return Err(DetectError::InvalidRange {
                        start: range.start,
                        end: range.end,
                        len: doc.len_chars(),
                    });
                }
            },
            None => (doc.text(), 0),
        };

        self.set_status(DetectionStatus::Working);
        let cycle = CycleId(self.next_cycle);
        self.next_cycle += 1;
        let fingerprint = Fingerprint::of(&text);

        if let Some(issues) = self.cache.get(&fingerprint) {
            debug!(cycle = cycle.0, issues = issues.len(), "result cache hit");
            self.settle_status();
            return Ok(CycleStart::Cached(DetectionOutcome {
                cycle: Some(cycle),
                source: OutcomeSource::Cache,
                issues,
                added: Vec::new(),
                skipped: SkipCounts::default(),
                discarded: false,
            }));
        }

        for flight in &mut self.in_flight {
            if flight.overlaps(range.as_ref()) {
                flight.stale = true;
            }
        }
        let before = self.in_flight.len();
        self.in_flight.retain(|flight| !flight.stale);
        if self.in_flight.len() < before {
            debug!(pruned = before - self.in_flight.len(), "dropped superseded flights");
        }
        self.in_flight.push(InFlight {
            cycle,
            range: range.clone(),
            stale: false,
        });
        debug!(cycle = cycle.0, ?range, chars = text.len(), "submitting text to linter");

        Ok(CycleStart::Lint(DetectionRequest {
            cycle,
            text,
            base_offset,
            range,
            fingerprint,
        }))
    }

    /// Finish a cycle with the linter's result.
    ///
    /// Feed every change made since [`Detector::begin`] through [`Detector::sync_changes`]
    /// first. A failed lint leaves the store untouched and returns the error. A result that was
    /// superseded by a newer overlapping cycle, whose target was edited, or that was abandoned is
    /// neither applied nor cached.
    pub fn complete<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        request: DetectionRequest,
        result: Result<Vec<Issue>, LintError>,
    ) -> Result<DetectionOutcome, DetectError> {
        if request.cycle.0 >= self.next_cycle {
            return Err(DetectError::UnknownCycle(request.cycle));
        }
        let flight = remove_flight(&mut self.in_flight, request.cycle);

        let issues: Arc<[Issue]> = match result {
            Ok(issues) => Arc::from(issues),
            Err(err) => {
                error!(cycle = request.cycle.0, error = %err, "linter failed; keeping existing annotations");
                self.settle_status();
                return Err(err.into());
            }
        };
        let mut outcome = DetectionOutcome {
            cycle: Some(request.cycle),
            source: OutcomeSource::Linter,
            issues: Arc::clone(&issues),
            added: Vec::new(),
            skipped: SkipCounts::default(),
            discarded: false,
        };

        let flight = match flight {
            Some(flight) if !flight.stale => flight,
            _ => {
                debug!(cycle = request.cycle.0, "discarding stale linter result");
                outcome.discarded = true;
                self.settle_status();
                return Ok(outcome);
            }
        };
        self.cache.insert(request.fingerprint, Arc::clone(&issues));

        let base_offset = match &flight.range {
            Some(range) => {
                self.store.clear_range(range.start, range.end);
                range.start
            }
            None => {
                self.store.clear_all();
                0
            }
        };

        let offsets = LineOffsets::new(&request.text);
        for issue in issues.iter() {
            self.reconcile_issue(doc, &offsets, base_offset, issue, &mut outcome);
        }

        info!(
            cycle = request.cycle.0,
            issues = issues.len(),
            added = outcome.added.len(),
            skipped = outcome.skipped.total(),
            "detection cycle complete"
        );
        self.settle_status();
        Ok(outcome)
    }

    fn reconcile_issue<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        offsets: &LineOffsets,
        base_offset: usize,
        issue: &Issue,
        outcome: &mut DetectionOutcome,
    ) {
        let skipped = &mut outcome.skipped;
        if issue.severity < self.settings.min_alert_level {
            skipped.below_floor += 1;
            return;
        }
        if self.settings.is_rule_ignored(&issue.check) {
            skipped.suppressed += 1;
            return;
        }

        let range = match offsets.map_issue(issue, base_offset) {
            Ok(range) => range,
            Err(err) => {
                warn!(check = %issue.check, error = %err, "dropping unmappable issue");
                skipped.unmapped += 1;
                return;
            }
        };
        let len = doc.len_chars();
        if range.end > len {
            let err = MappingError::OutsideDocument {
                from: range.start,
                to: range.end,
                len,
            };
            warn!(check = %issue.check, error = %err, "dropping issue");
            skipped.outside_document += 1;
            return;
        }

        if self.store.contains_range(range.start, range.end) {
            skipped.duplicate += 1;
            return;
        }
        if self.ledger.is_ignored(range.start, range.end) {
            skipped.ignored += 1;
            return;
        }
        if self.ledger.contains_term(&issue.matched) {
            skipped.in_dictionary += 1;
            return;
        }
        if !(doc.is_checkable(range.start) && doc.is_checkable(range.end - 1)) {
            skipped.not_checkable += 1;
            return;
        }

        if let Some(id) = self
            .store
            .add(range.start, range.end, Arc::new(issue.clone()))
        {
            outcome.added.push(id);
        }
    }

    /// Run one complete cycle, awaiting the linter in between.
    ///
    /// The document is held for the whole cycle, so no edits can interleave. Dropping the
    /// returned future while the linter runs abandons the cycle.
    pub async fn run<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        trigger: Trigger,
    ) -> Result<DetectionOutcome, DetectError> {
        self.sync_changes(doc);
        let request = match self.begin(doc, trigger)? {
            CycleStart::Idle => return Ok(DetectionOutcome::idle()),
            CycleStart::Cached(outcome) => return Ok(outcome),
            CycleStart::Lint(request) => request,
        };
        let guard = FlightGuard {
            in_flight: &mut self.in_flight,
            status: &mut self.status,
            cycle: Some(request.cycle),
        };
        let result = self.linter.lint(&request.text).await;
        guard.disarm();
        self.sync_changes(doc);
        self.complete(doc, request, result)
    }
}
