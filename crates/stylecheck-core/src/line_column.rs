//! Adapter for hosts that speak line/column positions.
//!
//! Older editor surfaces address text as `(line, ch)` pairs, report edits as lists of inserted
//! and removed lines, and expose a per-position lexical token type instead of a prose classifier.
//! [`LineColumnAdapter`] turns such a host into a [`Document`].
//!
//! The host reports edits after applying them, so the adapter keeps a shadow rope of the text as
//! of the last drained change. Each host change is resolved against the shadow (which is exactly
//! the pre-edit text for that change) and then applied to it.

use crate::change::{DocumentChange, EditOrigin};
use crate::document::{Document, DocumentError};
use ropey::Rope;
use std::ops::Range;

/// A 0-based line and character column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LineCol {
    /// 0-based line.
    pub line: usize,
    /// 0-based character column.
    pub ch: usize,
}

impl LineCol {
    /// Create a position.
    pub fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }
}

/// One edit as reported by a line/column host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineColumnChange {
    /// Start of the edit.
    pub from: LineCol,
    /// Inserted lines (a single empty string for a pure deletion).
    pub text: Vec<String>,
    /// Removed lines (a single empty string for a pure insertion).
    pub removed: Vec<String>,
    /// Who produced the edit.
    pub origin: EditOrigin,
}

/// The editor surface behind a [`LineColumnAdapter`].
pub trait LineColumnHost {
    /// Full text.
    fn value(&self) -> String;
    /// Text between two positions.
    fn range(&self, from: LineCol, to: LineCol) -> String;
    /// Text of a 0-based line without its break.
    fn line(&self, line: usize) -> Option<String>;
    /// Number of lines.
    fn line_count(&self) -> usize;
    /// Character offset of a position.
    fn index_from_pos(&self, pos: LineCol) -> usize;
    /// Position of a character offset.
    fn pos_from_index(&self, index: usize) -> LineCol;
    /// Current selection, if non-empty.
    fn selection(&self) -> Option<(LineCol, LineCol)>;
    /// Replace `[from, to)` with `text`. The host reports the edit through
    /// [`LineColumnHost::take_changes`] like any other.
    fn replace_range(
        &mut self,
        text: &str,
        from: LineCol,
        to: LineCol,
        origin: EditOrigin,
    ) -> Result<(), String>;
    /// Lexical token type at `pos`; `None` for plain prose.
    fn token_type_at(&self, pos: LineCol) -> Option<String>;
    /// Drain reported edits in the order they happened.
    fn take_changes(&mut self) -> Vec<LineColumnChange>;
}

/// Presents a [`LineColumnHost`] as a [`Document`].
#[derive(Debug)]
pub struct LineColumnAdapter<H> {
    host: H,
    shadow: Rope,
}

impl<H: LineColumnHost> LineColumnAdapter<H> {
    /// Wrap `host`, snapshotting its current text.
    pub fn new(host: H) -> Self {
        let shadow = Rope::from_str(&host.value());
        Self { host, shadow }
    }

    /// Borrow the host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutably borrow the host. Edits made through it are picked up by the next
    /// [`Document::take_changes`].
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn resolve(&mut self, change: LineColumnChange) -> DocumentChange {
        let line = change.from.line.min(self.shadow.len_lines().saturating_sub(1));
        let line_start = self.shadow.line_to_char(line);
        let start = (line_start + change.from.ch).min(self.shadow.len_chars());
        let deleted_len = change.removed.join("\n").chars().count();
        let end = (start + deleted_len).min(self.shadow.len_chars());
        let inserted = change.text.join("\n");

        self.shadow.remove(start..end);
        self.shadow.insert(start, &inserted);
        DocumentChange::new(start, end - start, inserted, change.origin)
    }
}

impl<H: LineColumnHost> Document for LineColumnAdapter<H> {
    fn len_chars(&self) -> usize {
        let last = self.host.line_count().saturating_sub(1);
        let last_len = self
            .host
            .line(last)
            .map_or(0, |line| line.chars().count());
        self.host.index_from_pos(LineCol::new(last, last_len))
    }

    fn text(&self) -> String {
        self.host.value()
    }

    fn slice(&self, range: Range<usize>) -> Option<String> {
        if range.start > range.end || range.end > self.len_chars() {
            return None;
        }
        Some(self.host.range(
            self.host.pos_from_index(range.start),
            self.host.pos_from_index(range.end),
        ))
    }

    fn line_count(&self) -> usize {
        self.host.line_count()
    }

    fn line_of(&self, pos: usize) -> usize {
        self.host.pos_from_index(pos).line
    }

    fn line_range(&self, line: usize) -> Option<Range<usize>> {
        let text = self.host.line(line)?;
        let start = self.host.index_from_pos(LineCol::new(line, 0));
        Some(start..start + text.chars().count())
    }

    fn selection(&self) -> Option<Range<usize>> {
        let (from, to) = self.host.selection()?;
        let (from, to) = (self.host.index_from_pos(from), self.host.index_from_pos(to));
        let range = from.min(to)..from.max(to);
        (range.start < range.end).then_some(range)
    }

    /// Forwards to the host. The change is not queued here: the host reports it.
    fn replace(
        &mut self,
        range: Range<usize>,
        text: &str,
        origin: EditOrigin,
    ) -> Result<DocumentChange, DocumentError> {
        let len = self.len_chars();
        if range.start > range.end || range.end > len {
            return Err(DocumentError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }
        let from = self.host.pos_from_index(range.start);
        let to = self.host.pos_from_index(range.end);
        self.host
            .replace_range(text, from, to, origin)
            .map_err(DocumentError::Rejected)?;
        Ok(DocumentChange::new(
            range.start,
            range.end - range.start,
            text,
            origin,
        ))
    }

    fn take_changes(&mut self) -> Vec<DocumentChange> {
        self.host
            .take_changes()
            .into_iter()
            .map(|change| self.resolve(change))
            .collect()
    }

    /// A position is prose when its line is non-empty and the host assigns it no token type.
    fn is_checkable(&self, pos: usize) -> bool {
        let at = self.host.pos_from_index(pos);
        let non_empty = self
            .host
            .line(at.line)
            .is_some_and(|line| !line.is_empty());
        non_empty && self.host.token_type_at(at).is_none()
    }
}
