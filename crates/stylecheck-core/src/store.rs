//! The live annotation set.
//!
//! [`AnnotationStore`] is the single owner of every annotation over the current document. It sits
//! on an [`IntervalSet`] so ranges are re-anchored through each [`DocumentChange`] instead of
//! being stored as stale absolute offsets somewhere else.
//!
//! Edit reaction:
//! - user-origin edits ([`crate::EditOrigin::is_user_edit`]) drop every annotation they touch, bounds
//!   inclusive, so typing at either end of a flagged word also clears the flag;
//! - programmatic edits (accepted suggestions, undo, host commands) only shift and clip;
//! - an annotation whose whole range was deleted is dropped regardless of origin.

use crate::change::DocumentChange;
use crate::intervals::{Entry, IntervalSet};
use crate::issue::Issue;
use std::sync::Arc;
use tracing::trace;

/// Stable identifier of an annotation for the lifetime of its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnnotationId(u64);

impl AnnotationId {
    /// Raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A live binding of one issue to `[from, to)` in the current document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Identifier.
    pub id: AnnotationId,
    /// Start offset (inclusive).
    pub from: usize,
    /// End offset (exclusive).
    pub to: usize,
    /// Bound issue.
    pub issue: Arc<Issue>,
}

impl Annotation {
    /// Covered range as a `Range`.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.from..self.to
    }
}

#[derive(Debug, Clone)]
struct Marker {
    id: AnnotationId,
    issue: Arc<Issue>,
}

fn to_annotation(entry: &Entry<Marker>) -> Annotation {
    Annotation {
        id: entry.value.id,
        from: entry.start,
        to: entry.end,
        issue: Arc::clone(&entry.value.issue),
    }
}

fn into_annotation(entry: Entry<Marker>) -> Annotation {
    Annotation {
        id: entry.value.id,
        from: entry.start,
        to: entry.end,
        issue: entry.value.issue,
    }
}

/// Position-tracked annotations.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    markers: IntervalSet<Marker>,
    next_id: u64,
}

impl AnnotationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an annotation over `[from, to)`.
    ///
    /// A zero-width range is widened by one character. Returns `None` (and changes nothing) when
    /// `from > to` or when an annotation already covers exactly this range: the first writer wins.
    pub fn add(&mut self, from: usize, to: usize, issue: Arc<Issue>) -> Option<AnnotationId> {
        if from > to {
            return None;
        }
        let to = if from == to { to + 1 } else { to };
        if self.markers.contains_exact(from, to) {
            trace!(from, to, check = %issue.check, "annotation already present");
            return None;
        }

        let id = AnnotationId(self.next_id);
        self.next_id += 1;
        self.markers.insert(from, to, Marker { id, issue });
        Some(id)
    }

    /// Remove every annotation. Returns how many were removed.
    pub fn clear_all(&mut self) -> usize {
        let removed = self.markers.len();
        self.markers.clear();
        removed
    }

    /// Remove every annotation meeting `[from, to]`: any overlap or contact, in either direction.
    pub fn clear_range(&mut self, from: usize, to: usize) -> Vec<Annotation> {
        self.markers
            .remove_intersecting(from, to)
            .into_iter()
            .map(into_annotation)
            .collect()
    }

    /// The annotation surfaced at `pos`: the first (lowest start) annotation whose half-open
    /// range contains it.
    pub fn find_at(&self, pos: usize) -> Option<Annotation> {
        self.markers.query_point(pos).first().map(|e| to_annotation(e))
    }

    /// Every annotation containing `pos`, in ascending start order.
    pub fn find_all_at(&self, pos: usize) -> Vec<Annotation> {
        self.markers
            .query_point(pos)
            .into_iter()
            .map(to_annotation)
            .collect()
    }

    /// Annotations overlapping the half-open range `[from, to)`.
    pub fn find_in(&self, from: usize, to: usize) -> Vec<Annotation> {
        self.markers
            .query_range(from, to)
            .into_iter()
            .map(to_annotation)
            .collect()
    }

    /// Look up an annotation by id.
    pub fn get(&self, id: AnnotationId) -> Option<Annotation> {
        self.markers
            .iter()
            .find(|e| e.value.id == id)
            .map(to_annotation)
    }

    /// Remove one annotation by id.
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        self.markers
            .remove_where(|e| e.value.id == id)
            .into_iter()
            .next()
            .map(into_annotation)
    }

    /// Remove every annotation whose issue satisfies `pred`.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&Issue) -> bool) -> Vec<Annotation> {
        self.markers
            .remove_where(|e| pred(&e.value.issue))
            .into_iter()
            .map(into_annotation)
            .collect()
    }

    /// Whether an annotation covers exactly `[from, to)`.
    pub fn contains_range(&self, from: usize, to: usize) -> bool {
        self.markers.contains_exact(from, to)
    }

    /// Re-anchor all annotations through `change`. Returns the annotations that were dropped.
    pub fn apply_change(&mut self, change: &DocumentChange) -> Vec<Annotation> {
        let user_edit = change.origin.is_user_edit();
        let dropped: Vec<Annotation> = self
            .markers
            .apply_change(change, |_, touched| !(touched && user_edit))
            .into_iter()
            .map(into_annotation)
            .collect();
        if !dropped.is_empty() {
            trace!(
                start = change.start,
                dropped = dropped.len(),
                origin = ?change.origin,
                "annotations invalidated by edit"
            );
        }
        dropped
    }

    /// Snapshot of every annotation in ascending start order.
    pub fn annotations(&self) -> Vec<Annotation> {
        self.markers.iter().map(to_annotation).collect()
    }

    /// Number of annotations.
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
