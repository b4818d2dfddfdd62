//! User dismissals: positional ignores and the personal dictionary.
//!
//! The ledger is injected into the detector at construction; nothing here reads ambient host
//! state. Hosts that persist the dictionary round-trip it through serde.

use crate::change::DocumentChange;
use crate::intervals::IntervalSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Ignored ranges and dictionary terms.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    ignored: IntervalSet<()>,
    dictionary: BTreeSet<String>,
}

/// Serializable form of the personal dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryFile {
    /// Terms, sorted.
    #[serde(default)]
    pub terms: Vec<String>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger seeded with dictionary terms.
    pub fn with_dictionary<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ledger = Self::new();
        for term in terms {
            ledger.add_to_dictionary(term);
        }
        ledger
    }

    /// Record a positional ignore for `[from, to)`.
    ///
    /// Recording the same range twice keeps a single entry.
    pub fn ignore_range(&mut self, from: usize, to: usize) {
        if !self.ignored.contains_exact(from, to) {
            self.ignored.insert(from, to, ());
        }
    }

    /// Whether exactly `[from, to)` was ignored.
    pub fn is_ignored(&self, from: usize, to: usize) -> bool {
        self.ignored.contains_exact(from, to)
    }

    /// Ignored ranges in ascending start order.
    pub fn ignored_ranges(&self) -> Vec<(usize, usize)> {
        self.ignored.iter().map(|e| (e.start, e.end)).collect()
    }

    /// Re-anchor positional ignores through `change`.
    ///
    /// An ignore only survives while its text is unchanged. A user edit touching it discards it,
    /// as does any edit that deletes from it or inserts inside it. Other programmatic edits at
    /// its boundary, such as a suggestion applied to the neighbouring word, just shift it.
    pub fn apply_change(&mut self, change: &DocumentChange) -> usize {
        self.ignored
            .apply_change(change, |entry, touched| {
                !touched || !change.modifies(entry.start, entry.end)
            })
            .len()
    }

    /// Add a term to the personal dictionary. Blank terms are ignored. Returns `true` if the term
    /// was new.
    pub fn add_to_dictionary(&mut self, term: impl Into<String>) -> bool {
        let term = term.into();
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return false;
        }
        if trimmed.len() == term.len() {
            self.dictionary.insert(term)
        } else {
            self.dictionary.insert(trimmed.to_string())
        }
    }

    /// Remove a dictionary term. Returns `true` if it was present.
    pub fn remove_from_dictionary(&mut self, term: &str) -> bool {
        self.dictionary.remove(term.trim())
    }

    /// Whether `term` is in the dictionary. Matching is exact and case-sensitive.
    pub fn contains_term(&self, term: &str) -> bool {
        let term = term.trim();
        !term.is_empty() && self.dictionary.contains(term)
    }

    /// Dictionary terms in sorted order.
    pub fn dictionary_terms(&self) -> impl Iterator<Item = &str> {
        self.dictionary.iter().map(String::as_str)
    }

    /// Snapshot the dictionary for persistence.
    pub fn to_dictionary_file(&self) -> DictionaryFile {
        DictionaryFile {
            terms: self.dictionary.iter().cloned().collect(),
        }
    }

    /// Replace the dictionary with persisted terms. Positional ignores are untouched.
    pub fn load_dictionary(&mut self, file: DictionaryFile) {
        self.dictionary.clear();
        for term in file.terms {
            self.add_to_dictionary(term);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::EditOrigin;

    #[test]
    fn test_ignores_are_exact() {
        let mut ledger = Ledger::new();
        ledger.ignore_range(5, 9);
        ledger.ignore_range(5, 9);
        assert!(ledger.is_ignored(5, 9));
        assert!(!ledger.is_ignored(5, 10));
        assert_eq!(ledger.ignored_ranges(), vec![(5, 9)]);
    }

    #[test]
    fn test_ignores_follow_edits_and_die_when_touched() {
        let mut ledger = Ledger::new();
        ledger.ignore_range(10, 14);
        ledger.ignore_range(30, 34);

        ledger.apply_change(&DocumentChange::insert(0, "ab", EditOrigin::Other));
        assert_eq!(ledger.ignored_ranges(), vec![(12, 16), (32, 36)]);

        let dropped =
            ledger.apply_change(&DocumentChange::new(33, 1, "X", EditOrigin::Suggestion));
        assert_eq!(dropped, 1);
        assert_eq!(ledger.ignored_ranges(), vec![(12, 16)]);

        let typed = ledger.apply_change(&DocumentChange::insert(16, "s", EditOrigin::Input));
        assert_eq!(typed, 1);
        assert!(ledger.ignored_ranges().is_empty());
    }

    #[test]
    fn test_suggestion_next_to_ignore_keeps_it() {
        // "teh wrod": "teh" ignored, then "wrod" replaced with "word" via its suggestion.
        let mut ledger = Ledger::new();
        ledger.ignore_range(0, 3);

        let dropped = ledger.apply_change(&DocumentChange::new(3, 5, " word", EditOrigin::Suggestion));
        assert_eq!(dropped, 0);
        assert_eq!(ledger.ignored_ranges(), vec![(0, 3)]);
        assert!(ledger.is_ignored(0, 3));

        ledger.apply_change(&DocumentChange::new(0, 0, "> ", EditOrigin::Other));
        assert_eq!(ledger.ignored_ranges(), vec![(2, 5)]);
    }

    #[test]
    fn test_dictionary_is_content_based() {
        let mut ledger = Ledger::with_dictionary(["teh"]);
        assert!(ledger.contains_term("teh"));
        assert!(!ledger.contains_term("Teh"));
        assert!(!ledger.add_to_dictionary("  "));
        assert!(ledger.add_to_dictionary(" recieve "));
        assert!(ledger.contains_term("recieve"));

        let file = ledger.to_dictionary_file();
        assert_eq!(file.terms, vec!["recieve".to_string(), "teh".to_string()]);

        let mut restored = Ledger::new();
        restored.load_dictionary(file);
        assert!(restored.remove_from_dictionary("teh"));
        assert_eq!(restored.dictionary_terms().collect::<Vec<_>>(), vec!["recieve"]);
    }
}
