//! Linter span → document offset mapping.
//!
//! The linter reports a 1-based line and a `[start, end]` column pair relative to the text it
//! was fed. [`LineOffsets`] is built once per detection cycle from that exact text and turns the
//! pair into a half-open character range; adding the request's base offset lands it in document
//! coordinates.

use crate::issue::Issue;
use std::ops::Range;
use thiserror::Error;

/// Reasons an issue cannot be placed in the document. All of them are recoverable: the issue is
/// dropped and the cycle continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("issue on out-of-bound line {line} (submitted text has {line_count} lines)")]
    /// The line is not in the submitted text's line table.
    LineOutOfBounds {
        /// 1-based line from the issue.
        line: usize,
        /// Number of lines in the submitted text.
        line_count: usize,
    },

    #[error("issue span [{start}, {end}] on line {line} is not a valid column range")]
    /// The span's start column is zero, or its end precedes its start.
    InvalidSpan {
        /// 1-based line from the issue.
        line: usize,
        /// Start column.
        start: usize,
        /// End column.
        end: usize,
    },

    #[error("issue range {from}..{to} falls outside the document (length {len})")]
    /// The mapped range lies beyond the end of the current document.
    OutsideDocument {
        /// Mapped start offset.
        from: usize,
        /// Mapped end offset.
        to: usize,
        /// Current document length in characters.
        len: usize,
    },
}

/// Table mapping each 1-based line number to the character offset where it begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineOffsets {
    /// `starts[i]` is the offset of line `i + 1`.
    starts: Vec<usize>,
}

impl LineOffsets {
    /// Scan `text` for `\n` line breaks.
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.chars()
                .enumerate()
                .filter(|(_, ch)| *ch == '\n')
                .map(|(idx, _)| idx + 1),
        );
        Self { starts }
    }

    /// Start offset of a 1-based line.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        line.checked_sub(1).and_then(|idx| self.starts.get(idx)).copied()
    }

    /// Number of lines in the table.
    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Map `(line, [start, end])` plus `base_offset` to a document range.
    ///
    /// `from = line_start + (start - 1) + base`, `to = line_start + end + base`. A zero-width
    /// result is widened by one character so the annotation stays addressable.
    pub fn map(
        &self,
        line: usize,
        span: [usize; 2],
        base_offset: usize,
    ) -> Result<Range<usize>, MappingError> {
        let line_start = self
            .line_start(line)
            .ok_or(MappingError::LineOutOfBounds {
                line,
                line_count: self.line_count(),
            })?;

        let [start, end] = span;
        let invalid = MappingError::InvalidSpan { line, start, end };
        let start_col = start.checked_sub(1).ok_or(invalid.clone())?;
        if end < start_col {
            return Err(invalid);
        }

        let from = line_start + start_col + base_offset;
        let mut to = line_start + end + base_offset;
        if from == to {
            to += 1;
        }
        Ok(from..to)
    }

    /// Map an issue's own line and span.
    pub fn map_issue(&self, issue: &Issue, base_offset: usize) -> Result<Range<usize>, MappingError> {
        self.map(issue.line, issue.span, base_offset)
    }
}
