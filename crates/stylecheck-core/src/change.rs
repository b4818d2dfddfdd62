//! Structured document change events.
//!
//! Hosts report every mutation of the live buffer as a [`DocumentChange`]. Changes are expressed in
//! **character offsets** (Unicode scalar values) in the document *before* the change is applied,
//! and must be fed to consumers in the order they happened.
//!
//! Everything that stores positions outside the document (annotations, ignored ranges, pending
//! auto-check ranges, in-flight detection targets) re-anchors itself through
//! [`DocumentChange::map_range`] instead of keeping raw absolute offsets.

/// Where an edit came from.
///
/// User-origin edits invalidate the annotations they touch; programmatic edits only shift and
/// clip them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditOrigin {
    /// Typing or deleting at the keyboard.
    Input,
    /// Pasted text.
    Paste,
    /// Replacement text accepted from an annotation's suggestion list.
    Suggestion,
    /// Any other programmatic change (undo, sync from disk, host commands).
    Other,
}

impl EditOrigin {
    /// Returns `true` for edits the user typed or pasted.
    pub fn is_user_edit(self) -> bool {
        matches!(self, Self::Input | Self::Paste)
    }
}

/// A single replacement of `[start, start + deleted_len)` by `inserted_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChange {
    /// Start character offset of the edit.
    pub start: usize,
    /// Number of characters removed at `start`.
    pub deleted_len: usize,
    /// Exact inserted text (may be empty).
    pub inserted_text: String,
    /// Who produced the edit.
    pub origin: EditOrigin,
}

impl DocumentChange {
    /// Create a change replacing `deleted_len` characters at `start`.
    pub fn new(
        start: usize,
        deleted_len: usize,
        inserted_text: impl Into<String>,
        origin: EditOrigin,
    ) -> Self {
        Self {
            start,
            deleted_len,
            inserted_text: inserted_text.into(),
            origin,
        }
    }

    /// Pure insertion at `start`.
    pub fn insert(start: usize, text: impl Into<String>, origin: EditOrigin) -> Self {
        Self::new(start, 0, text, origin)
    }

    /// Pure deletion of `[start, end)`.
    pub fn delete(start: usize, end: usize, origin: EditOrigin) -> Self {
        Self::new(start, end.saturating_sub(start), String::new(), origin)
    }

    /// Exclusive end character offset in the pre-edit document.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.deleted_len)
    }

    /// Length of `inserted_text` in characters.
    pub fn inserted_len(&self) -> usize {
        self.inserted_text.chars().count()
    }

    /// Exclusive end of the inserted text in the post-edit document.
    pub fn inserted_end(&self) -> usize {
        self.start.saturating_add(self.inserted_len())
    }

    /// Net change in document length.
    pub fn len_delta(&self) -> isize {
        self.inserted_len() as isize - self.deleted_len as isize
    }

    /// Whether the edit touches `[start, end]`, bounds inclusive, in pre-edit coordinates.
    ///
    /// Typing directly before or after a range counts as touching it.
    pub fn touches(&self, start: usize, end: usize) -> bool {
        self.start <= end && start <= self.end()
    }

    /// Whether the edit changes the text of `[start, end)`, in pre-edit coordinates.
    ///
    /// User edits count when they touch the range at all. Other edits only count when they
    /// delete from it or insert strictly inside it, so they can shift a range without changing it.
    pub fn modifies(&self, start: usize, end: usize) -> bool {
        if self.origin.is_user_edit() {
            return self.touches(start, end);
        }
        let deletes_inside = self.deleted_len > 0 && self.start < end && start < self.end();
        let inserts_inside = self.start > start && self.start < end;
        deletes_inside || inserts_inside
    }

    /// Re-anchor the half-open range `[start, end)` through this change.
    ///
    /// - Text removed before the range shifts it left; text removed inside shrinks it.
    /// - Text inserted at or before `start` shifts the range; text inserted strictly inside
    ///   extends it; text inserted at `end` leaves it alone.
    ///
    /// Returns `None` when a non-empty range lies entirely inside the deleted text.
    pub fn map_range(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        let (mut start, mut end) = (start, end);

        let del_start = self.start;
        let del_end = self.end();
        if del_end > del_start && end > del_start {
            let removed = del_end - del_start;
            if start >= del_end {
                start -= removed;
                end -= removed;
            } else if start >= del_start && end <= del_end {
                return None;
            } else if start < del_start && end > del_end {
                end -= removed;
            } else if start < del_start {
                end = del_start;
            } else {
                start = del_start;
                end -= removed;
            }
        }

        let inserted = self.inserted_len();
        if inserted > 0 {
            if start >= del_start {
                start += inserted;
                end += inserted;
            } else if end > del_start {
                end += inserted;
            }
        }

        Some((start, end))
    }
}
