//! Markdown prose classification.
//!
//! The linter flags words, but a Markdown note also contains code, markup and addresses that are
//! not prose. [`ProseClassifier`] finds those regions with a handful of regular expressions and
//! reports them as excluded character ranges; positions outside every range are checkable.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

struct Patterns {
    front_matter: Regex,
    backtick_fence: Regex,
    tilde_fence: Regex,
    inline_code: Regex,
    html_comment: Regex,
    html_tag: Regex,
    link_destination: Regex,
    wiki_link: Regex,
    bare_url: Regex,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    front_matter: Regex::new(r"\A---[ \t]*\r?\n(?s:.*?)\n---[ \t]*(?:\r?\n|\z)")
        .expect("valid front matter regex"),
    backtick_fence: Regex::new(r"(?ms)^[ \t]*```[^\n]*\n.*?(?:^[ \t]*```[ \t]*$|\z)")
        .expect("valid fence regex"),
    tilde_fence: Regex::new(r"(?ms)^[ \t]*~~~[^\n]*\n.*?(?:^[ \t]*~~~[ \t]*$|\z)")
        .expect("valid fence regex"),
    inline_code: Regex::new(r"`[^`\n]+`").expect("valid inline code regex"),
    html_comment: Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"),
    html_tag: Regex::new(r"</?[A-Za-z][A-Za-z0-9-]*(?:\s[^<>\n]*)?/?>").expect("valid tag regex"),
    link_destination: Regex::new(r"\]\([^)\n]*\)").expect("valid link regex"),
    wiki_link: Regex::new(r"\[\[[^\]\n]*\]\]").expect("valid wiki link regex"),
    bare_url: Regex::new(r"\b(?:https?|ftp)://[^\s<>()\[\]]+").expect("valid url regex"),
});

/// Sorted, non-overlapping excluded character ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    ranges: Vec<Range<usize>>,
}

impl Exclusions {
    /// Build from arbitrary ranges, merging overlaps and dropping empty ones.
    pub fn from_ranges(mut ranges: Vec<Range<usize>>) -> Self {
        ranges.retain(|r| r.start < r.end);
        ranges.sort_by_key(|r| r.start);

        let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
                _ => merged.push(range),
            }
        }
        Self { ranges: merged }
    }

    /// Whether `pos` is inside an excluded range.
    pub fn contains(&self, pos: usize) -> bool {
        let idx = self.ranges.partition_point(|r| r.end <= pos);
        self.ranges.get(idx).is_some_and(|r| r.start <= pos)
    }

    /// The excluded ranges.
    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    /// Whether nothing is excluded.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Finds non-prose regions of Markdown text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProseClassifier;

impl ProseClassifier {
    /// Create a classifier.
    pub fn new() -> Self {
        Self
    }

    /// Excluded regions of `text`, in character offsets.
    pub fn classify(&self, text: &str) -> Exclusions {
        let p = &*PATTERNS;
        let mut byte_ranges: Vec<Range<usize>> = Vec::new();
        for re in [
            &p.front_matter,
            &p.backtick_fence,
            &p.tilde_fence,
            &p.inline_code,
            &p.html_comment,
            &p.html_tag,
            &p.link_destination,
            &p.wiki_link,
            &p.bare_url,
        ] {
            byte_ranges.extend(re.find_iter(text).map(|m| m.range()));
        }

        if byte_ranges.is_empty() {
            return Exclusions::default();
        }
        Exclusions::from_ranges(bytes_to_chars(text, byte_ranges))
    }
}

/// Convert byte ranges on char boundaries to char ranges in a single pass over `text`.
fn bytes_to_chars(text: &str, ranges: Vec<Range<usize>>) -> Vec<Range<usize>> {
    let mut points: Vec<usize> = ranges.iter().flat_map(|r| [r.start, r.end]).collect();
    points.sort_unstable();
    points.dedup();

    let mut char_points = Vec::with_capacity(points.len());
    let mut next = points.iter().peekable();
    let mut char_idx: usize = 0;
    for (byte_idx, _) in text.char_indices().chain(std::iter::once((text.len(), ' '))) {
        while next.next_if(|&&p| p <= byte_idx).is_some() {
            char_points.push(char_idx);
        }
        char_idx += 1;
    }

    let lookup = |byte: usize| -> usize {
        let idx = points.partition_point(|&p| p < byte);
        char_points.get(idx).copied().unwrap_or(char_idx.saturating_sub(1))
    };
    ranges
        .into_iter()
        .map(|r| lookup(r.start)..lookup(r.end))
        .collect()
}
