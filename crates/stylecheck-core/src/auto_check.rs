//! Debounced auto-check queue.
//!
//! User edits append dirty ranges; each new edit pushes the deadline out by the quiet period.
//! Once the deadline passes, the host starts one detection cycle over the union of the pending
//! ranges widened to whole lines, and the queue is emptied.

use crate::change::DocumentChange;
use crate::document::Document;
use crate::intervals::IntervalSet;
use std::ops::Range;
use std::time::{Duration, Instant};

/// Quiet period after the last edit before an automatic check fires.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(3000);

/// Pending dirty ranges and the debounce deadline.
#[derive(Debug, Clone)]
pub struct AutoCheckQueue {
    quiet: Duration,
    dirty: IntervalSet<()>,
    deadline: Option<Instant>,
}

impl AutoCheckQueue {
    /// Create a queue with the given quiet period.
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            dirty: IntervalSet::new(),
            deadline: None,
        }
    }

    /// Record the post-edit range of a user edit and restart the quiet window.
    ///
    /// Call after [`AutoCheckQueue::apply_change`] so earlier ranges are already re-anchored.
    pub fn record(&mut self, change: &DocumentChange, now: Instant) {
        self.dirty
            .insert(change.start, change.inserted_end(), ());
        self.deadline = Some(now + self.quiet);
    }

    /// Re-anchor pending ranges through an edit.
    pub fn apply_change(&mut self, change: &DocumentChange) {
        self.dirty.apply_change(change, |_, _| true);
    }

    /// Whether ranges are pending.
    pub fn has_pending(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Whether the quiet period has elapsed with work pending.
    pub fn is_due(&self, now: Instant) -> bool {
        self.has_pending() && self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Drain the queue, returning the range to check.
    ///
    /// Every line touched by a pending range whose first non-blank character is checkable is
    /// kept; the result spans from the start of the first kept line to the end of the last one.
    /// `None` when nothing checkable is pending.
    pub fn take_dirty_lines<D: Document + ?Sized>(&mut self, doc: &D) -> Option<Range<usize>> {
        self.deadline = None;
        if self.dirty.is_empty() {
            return None;
        }

        let mut lines: Vec<usize> = Vec::new();
        for entry in self.dirty.iter() {
            let first = doc.line_of(entry.start);
            let last = doc.line_of(entry.end.saturating_sub(1).max(entry.start));
            lines.extend(first..=last);
        }
        self.dirty.clear();
        lines.sort_unstable();
        lines.dedup();

        let checkable: Vec<Range<usize>> = lines
            .into_iter()
            .filter_map(|line| doc.line_range(line))
            .filter(|range| line_is_checkable(doc, range))
            .collect();

        let first = checkable.first()?;
        let last = checkable.last()?;
        Some(first.start..last.end)
    }

    /// Drop all pending work.
    pub fn clear(&mut self) {
        self.dirty.clear();
        self.deadline = None;
    }
}

impl Default for AutoCheckQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

fn line_is_checkable<D: Document + ?Sized>(doc: &D, range: &Range<usize>) -> bool {
    if range.is_empty() {
        return false;
    }
    let Some(text) = doc.slice(range.clone()) else {
        return false;
    };
    match text.chars().position(|ch| !ch.is_whitespace()) {
        Some(offset) => doc.is_checkable(range.start + offset),
        None => false,
    }
}
