//! The document capability consumed by the detector.
//!
//! A host exposes its live buffer through [`Document`]: read text and slices, resolve lines,
//! report the selection, apply a replacement, hand over the changes that happened since the last
//! call, and classify whether a position is prose. Every offset is a character offset.
//!
//! [`TextDocument`] is the reference implementation, backed by a rope. Hosts with a
//! line/column API use [`crate::line_column::LineColumnAdapter`] instead.

use crate::change::{DocumentChange, EditOrigin};
use crate::classify::{Exclusions, ProseClassifier};
use ropey::Rope;
use std::ops::Range;
use thiserror::Error;

/// Errors reported by document operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("range {start}..{end} is out of bounds (document length {len})")]
    /// The range does not fit in the document.
    RangeOutOfBounds {
        /// Range start.
        start: usize,
        /// Range end.
        end: usize,
        /// Document length in characters.
        len: usize,
    },

    #[error("host rejected the edit: {0}")]
    /// The host could not apply the edit.
    Rejected(String),
}

/// Host text buffer as seen by the detection engine.
pub trait Document {
    /// Length in characters.
    fn len_chars(&self) -> usize;

    /// Full text.
    fn text(&self) -> String;

    /// Text of `range`, or `None` if it does not fit in the document.
    fn slice(&self, range: Range<usize>) -> Option<String>;

    /// Number of lines (a trailing newline starts an empty last line).
    fn line_count(&self) -> usize;

    /// 0-based line containing `pos` (clamped to the last line).
    fn line_of(&self, pos: usize) -> usize;

    /// Character range of a 0-based line, excluding its line break.
    fn line_range(&self, line: usize) -> Option<Range<usize>>;

    /// Current non-empty selection, if any.
    fn selection(&self) -> Option<Range<usize>>;

    /// Replace `range` with `text`.
    ///
    /// The returned change describes the edit in pre-edit coordinates. Whether the change is
    /// also reported by [`Document::take_changes`] depends on the implementation: see the
    /// implementor's docs.
    fn replace(
        &mut self,
        range: Range<usize>,
        text: &str,
        origin: EditOrigin,
    ) -> Result<DocumentChange, DocumentError>;

    /// Drain changes applied since the last call, in the order they happened.
    fn take_changes(&mut self) -> Vec<DocumentChange>;

    /// Whether `pos` lies in prose the linter should report on.
    fn is_checkable(&self, pos: usize) -> bool;
}

/// Rope-backed document with a Markdown prose classifier.
///
/// Every edit, including those made through [`Document::replace`], is queued for
/// [`Document::take_changes`].
#[derive(Debug, Clone)]
pub struct TextDocument {
    rope: Rope,
    selection: Option<Range<usize>>,
    pending: Vec<DocumentChange>,
    classifier: ProseClassifier,
    exclusions: Exclusions,
}

impl TextDocument {
    /// Create a document holding `text`.
    pub fn new(text: &str) -> Self {
        let classifier = ProseClassifier::new();
        Self {
            rope: Rope::from_str(text),
            selection: None,
            pending: Vec::new(),
            exclusions: classifier.classify(text),
            classifier,
        }
    }

    /// Set or clear the selection. Empty or out-of-bounds selections are cleared.
    pub fn set_selection(&mut self, selection: Option<Range<usize>>) {
        let len = self.len_chars();
        self.selection = selection.filter(|r| r.start < r.end && r.end <= len);
    }

    /// Insert `text` at `pos`.
    pub fn insert(
        &mut self,
        pos: usize,
        text: &str,
        origin: EditOrigin,
    ) -> Result<DocumentChange, DocumentError> {
        self.replace(pos..pos, text, origin)
    }

    /// Delete `range`.
    pub fn delete(
        &mut self,
        range: Range<usize>,
        origin: EditOrigin,
    ) -> Result<DocumentChange, DocumentError> {
        self.replace(range, "", origin)
    }
}

impl Default for TextDocument {
    fn default() -> Self {
        Self::new("")
    }
}

impl Document for TextDocument {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn slice(&self, range: Range<usize>) -> Option<String> {
        if range.start > range.end || range.end > self.rope.len_chars() {
            return None;
        }
        Some(self.rope.slice(range).to_string())
    }

    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_of(&self, pos: usize) -> usize {
        self.rope.char_to_line(pos.min(self.rope.len_chars()))
    }

    fn line_range(&self, line: usize) -> Option<Range<usize>> {
        if line >= self.rope.len_lines() {
            return None;
        }
        let start = self.rope.line_to_char(line);
        let line_slice = self.rope.line(line);
        let mut len = line_slice.len_chars();
        if len > 0 && line_slice.char(len - 1) == '\n' {
            len -= 1;
            if len > 0 && line_slice.char(len - 1) == '\r' {
                len -= 1;
            }
        }
        Some(start..start + len)
    }

    fn selection(&self) -> Option<Range<usize>> {
        self.selection.clone()
    }

    fn replace(
        &mut self,
        range: Range<usize>,
        text: &str,
        origin: EditOrigin,
    ) -> Result<DocumentChange, DocumentError> {
        let len = self.rope.len_chars();
        if range.start > range.end || range.end > len {
            return Err(DocumentError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }

        let change = DocumentChange::new(range.start, range.end - range.start, text, origin);
        self.rope.remove(range.clone());
        self.rope.insert(range.start, text);

        self.selection = self
            .selection
            .take()
            .and_then(|sel| change.map_range(sel.start, sel.end))
            .map(|(start, end)| start..end)
            .filter(|sel| sel.start < sel.end);
        self.exclusions = self.classifier.classify(&self.rope.to_string());
        self.pending.push(change.clone());
        Ok(change)
    }

    fn take_changes(&mut self) -> Vec<DocumentChange> {
        std::mem::take(&mut self.pending)
    }

    fn is_checkable(&self, pos: usize) -> bool {
        pos < self.rope.len_chars() && !self.exclusions.contains(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_queues_change_and_updates_text() {
        let mut doc = TextDocument::new("hello world");
        let change = doc.replace(6..11, "there", EditOrigin::Input).unwrap();
        assert_eq!(doc.text(), "hello there");
        assert_eq!(change.deleted_len, 5);
        assert_eq!(doc.take_changes(), vec![change]);
        assert!(doc.take_changes().is_empty());
    }

    #[test]
    fn test_out_of_bounds_replace_fails() {
        let mut doc = TextDocument::new("abc");
        assert_eq!(
            doc.replace(2..9, "x", EditOrigin::Other),
            Err(DocumentError::RangeOutOfBounds {
                start: 2,
                end: 9,
                len: 3
            })
        );
        assert_eq!(doc.text(), "abc");
    }

    #[test]
    fn test_lines_exclude_breaks() {
        let doc = TextDocument::new("one\r\ntwo\nthree");
        assert_eq!(doc.line_count(), 3);
        assert_eq!(doc.line_range(0), Some(0..3));
        assert_eq!(doc.line_range(1), Some(5..8));
        assert_eq!(doc.line_range(2), Some(9..14));
        assert_eq!(doc.line_range(3), None);
        assert_eq!(doc.line_of(6), 1);
        assert_eq!(doc.line_of(100), 2);
    }

    #[test]
    fn test_selection_follows_edits() {
        let mut doc = TextDocument::new("abc def ghi");
        doc.set_selection(Some(4..7));
        doc.insert(0, "xx", EditOrigin::Input).unwrap();
        assert_eq!(doc.selection(), Some(6..9));
        doc.set_selection(Some(3..3));
        assert_eq!(doc.selection(), None);
    }

    #[test]
    fn test_code_is_not_checkable() {
        let mut doc = TextDocument::new("Use `grep` here");
        assert!(doc.is_checkable(0));
        assert!(!doc.is_checkable(5));
        assert!(!doc.is_checkable(15));
        doc.replace(4..10, "grep", EditOrigin::Input).unwrap();
        assert!(doc.is_checkable(5));
    }
}
