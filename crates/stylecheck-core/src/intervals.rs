//! Position-tracked interval set.
//!
//! A sorted vector of half-open `[start, end)` character ranges, each carrying a payload. It backs
//! the annotation store, the ignored-range ledger and the auto-check dirty queue, and re-anchors
//! every entry through [`DocumentChange`]s in document order.

use crate::change::DocumentChange;

/// A single interval with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<T> {
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
    /// Payload bound to this interval.
    pub value: T,
}

impl<T> Entry<T> {
    /// Check if the entry contains a specific position.
    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Check if the entry overlaps the half-open range `[start, end)`.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }

    /// Check if the entry meets `[from, to]` with inclusive bounds on both sides.
    ///
    /// This is the "any contact" test used by ranged clears: an entry that starts or ends inside
    /// the range, or that contains the range, intersects it.
    pub fn intersects_inclusive(&self, from: usize, to: usize) -> bool {
        self.start <= to && from <= self.end
    }
}

/// Interval set kept sorted by start offset.
///
/// Query complexity: O(log n + k), where k is the number of reported intervals.
/// Insertion complexity: O(n) (requires maintaining sort order).
#[derive(Debug, Clone)]
pub struct IntervalSet<T> {
    /// Entries, sorted by start; entries with equal starts keep insertion order.
    entries: Vec<Entry<T>>,
    /// Prefix maximum end position: `prefix_max_end[i] = max(entries[0..=i].end)`
    ///
    /// Used for early pruning in `query_point` / `query_range`.
    prefix_max_end: Vec<usize>,
}

impl<T> IntervalSet<T> {
    /// Create an empty interval set.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            prefix_max_end: Vec::new(),
        }
    }

    fn rebuild_prefix_max_end_from(&mut self, start_idx: usize) {
        if self.entries.is_empty() {
            self.prefix_max_end.clear();
            return;
        }

        if self.prefix_max_end.len() != self.entries.len() {
            self.prefix_max_end.resize(self.entries.len(), 0);
        }

        let mut max_end = if start_idx == 0 {
            0
        } else {
            self.prefix_max_end[start_idx - 1]
        };

        for (idx, entry) in self.entries.iter().enumerate().skip(start_idx) {
            max_end = max_end.max(entry.end);
            self.prefix_max_end[idx] = max_end;
        }
    }

    fn rebuild_prefix_max_end(&mut self) {
        self.rebuild_prefix_max_end_from(0);
    }

    /// Insert an interval. Returns its index in sorted order.
    pub fn insert(&mut self, start: usize, end: usize, value: T) -> usize {
        let pos = self.entries.partition_point(|e| e.start <= start);
        self.entries.insert(pos, Entry { start, end, value });
        self.prefix_max_end.insert(pos, 0);
        self.rebuild_prefix_max_end_from(pos);
        pos
    }

    /// Find the first entry with exactly `[start, end)`.
    pub fn find_exact(&self, start: usize, end: usize) -> Option<&Entry<T>> {
        let first = self.entries.partition_point(|e| e.start < start);
        self.entries[first..]
            .iter()
            .take_while(|e| e.start == start)
            .find(|e| e.end == end)
    }

    /// Whether an entry with exactly `[start, end)` exists.
    pub fn contains_exact(&self, start: usize, end: usize) -> bool {
        self.find_exact(start, end).is_some()
    }

    /// Query all entries containing a specific position, in ascending start order.
    pub fn query_point(&self, pos: usize) -> Vec<&Entry<T>> {
        self.query_point_impl(pos).0
    }

    fn query_point_impl(&self, pos: usize) -> (Vec<&Entry<T>>, usize) {
        if self.entries.is_empty() {
            return (Vec::new(), 0);
        }

        let mut result = Vec::new();
        let mut scanned = 0usize;

        // All entries with start <= pos are before idx.
        let idx = self.entries.partition_point(|e| e.start <= pos);

        for i in (0..idx).rev() {
            scanned = scanned.saturating_add(1);

            // If maximum end of `entries[0..=i]` is <= pos, earlier entries cannot contain pos.
            if self.prefix_max_end[i] <= pos {
                break;
            }

            let entry = &self.entries[i];
            if entry.contains(pos) {
                result.push(entry);
            }
        }

        result.reverse();
        (result, scanned)
    }

    #[cfg(test)]
    fn query_point_scan_count(&self, pos: usize) -> usize {
        self.query_point_impl(pos).1
    }

    /// Query all entries overlapping the half-open range `[start, end)`.
    pub fn query_range(&self, start: usize, end: usize) -> Vec<&Entry<T>> {
        if self.entries.is_empty() || start >= end {
            return Vec::new();
        }

        // All entries that may overlap are before this position.
        let search_end = self.entries.partition_point(|e| e.start < end);
        if search_end == 0 {
            return Vec::new();
        }

        let mut scan_start = self
            .entries
            .partition_point(|e| e.start < start)
            .min(search_end);

        while scan_start > 0 && self.prefix_max_end[scan_start - 1] > start {
            scan_start -= 1;
        }

        self.entries[scan_start..search_end]
            .iter()
            .filter(|e| e.overlaps(start, end))
            .collect()
    }

    /// Remove and return every entry for which `pred` returns `true`.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&Entry<T>) -> bool) -> Vec<Entry<T>> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if pred(&entry) {
                removed.push(entry);
            } else {
                kept.push(entry);
            }
        }
        self.entries = kept;
        if !removed.is_empty() {
            self.rebuild_prefix_max_end();
        }
        removed
    }

    /// Remove every entry meeting `[from, to]` (see [`Entry::intersects_inclusive`]).
    pub fn remove_intersecting(&mut self, from: usize, to: usize) -> Vec<Entry<T>> {
        self.remove_where(|e| e.intersects_inclusive(from, to))
    }

    /// Re-anchor every entry through `change`.
    ///
    /// `keep` is consulted for each surviving entry with `touched` set when the change met the
    /// entry's pre-edit range (bounds inclusive); returning `false` drops the entry. Entries whose
    /// whole range was deleted are always dropped. Returns the dropped entries.
    pub fn apply_change(
        &mut self,
        change: &DocumentChange,
        mut keep: impl FnMut(&Entry<T>, bool) -> bool,
    ) -> Vec<Entry<T>> {
        let mut dropped = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());

        for mut entry in self.entries.drain(..) {
            let touched = change.touches(entry.start, entry.end);
            if touched && !keep(&entry, true) {
                dropped.push(entry);
                continue;
            }
            match change.map_range(entry.start, entry.end) {
                Some((start, end)) => {
                    entry.start = start;
                    entry.end = end;
                    if !touched && !keep(&entry, false) {
                        dropped.push(entry);
                    } else {
                        kept.push(entry);
                    }
                }
                None => dropped.push(entry),
            }
        }

        // Re-anchoring is monotonic in start offset; the stable sort only restores insertion
        // order among entries that collapsed onto the same start.
        kept.sort_by_key(|e| e.start);
        self.entries = kept;
        self.rebuild_prefix_max_end();
        dropped
    }

    /// Iterate over entries in ascending start order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry<T>> {
        self.entries.iter()
    }

    /// Clear all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.prefix_max_end.clear();
    }

    /// Get number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for IntervalSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
