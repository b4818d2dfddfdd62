//! Pointer/cursor interaction with annotations.
//!
//! A host asks for the [`AnnotationPopup`] under a position, shows it however it likes, and
//! sends the user's choice back through [`Detector::perform`].

use crate::change::{DocumentChange, EditOrigin};
use crate::detector::Detector;
use crate::document::{Document, DocumentError};
use crate::issue::Severity;
use crate::linter::Linter;
use crate::store::{Annotation, AnnotationId};
use std::ops::Range;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from user actions on annotations.
#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("annotation {0:?} no longer exists")]
    /// The annotation was removed (by an edit or another action) before the action arrived.
    UnknownAnnotation(AnnotationId),

    #[error("{action:?} is not offered for rule '{check}'")]
    /// The action does not match the issue's category.
    ActionNotOffered {
        /// Requested action.
        action: DismissAction,
        /// Rule identifier.
        check: String,
    },

    #[error(transparent)]
    /// Applying the replacement failed.
    Document(#[from] DocumentError),
}

/// The dismissal offered for an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissAction {
    /// Ignore this occurrence.
    Ignore,
    /// Add the matched word to the personal dictionary.
    AddToDictionary,
}

/// Everything a host needs to render the annotation under the pointer.
#[derive(Debug, Clone)]
pub struct AnnotationPopup {
    /// Annotation id, for [`Detector::perform`].
    pub annotation: AnnotationId,
    /// Covered range.
    pub range: Range<usize>,
    /// Rule identifier.
    pub title: String,
    /// Message.
    pub message: String,
    /// Reference link.
    pub link: Option<String>,
    /// Severity.
    pub severity: Severity,
    /// Up to three non-blank replacement candidates.
    pub replacements: Vec<String>,
    /// The one dismissal offered.
    pub dismiss: DismissAction,
}

impl AnnotationPopup {
    fn from_annotation(annotation: &Annotation) -> Self {
        let issue = &annotation.issue;
        Self {
            annotation: annotation.id,
            range: annotation.range(),
            title: issue.check.clone(),
            message: issue.message.clone(),
            link: issue.link().map(str::to_string),
            severity: issue.severity,
            replacements: issue.replacements().into_iter().map(str::to_string).collect(),
            dismiss: if issue.is_spelling() {
                DismissAction::AddToDictionary
            } else {
                DismissAction::Ignore
            },
        }
    }
}

/// A user's choice on an annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Replace the annotated text.
    Apply {
        /// Replacement text.
        replacement: String,
    },
    /// Ignore this occurrence.
    Ignore,
    /// Add the matched text to the dictionary.
    AddToDictionary,
}

/// Effect of a performed action.
#[derive(Debug, Clone, Default)]
pub struct ActionOutcome {
    /// Annotations removed by the action.
    pub removed: Vec<AnnotationId>,
    /// The document edit, for `Apply`.
    pub change: Option<DocumentChange>,
}

impl<L: Linter> Detector<L> {
    /// The popup for the annotation at `pos`, if any.
    pub fn popup_at(&self, pos: usize) -> Option<AnnotationPopup> {
        self.store
            .find_at(pos)
            .map(|annotation| AnnotationPopup::from_annotation(&annotation))
    }

    /// Carry out a user action on an annotation.
    ///
    /// - `Apply` replaces the annotated range with the replacement (as a suggestion-origin edit)
    ///   and removes the annotation.
    /// - `Ignore` records the range in the ledger and removes the annotation.
    /// - `AddToDictionary` records the matched text (or the annotated text when the linter did
    ///   not report a match) and removes every annotation with that matched text.
    ///
    /// Only the dismissal the popup offers is accepted.
    pub fn perform<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        id: AnnotationId,
        action: UserAction,
    ) -> Result<ActionOutcome, InteractionError> {
        self.sync_changes(doc);
        let annotation = self
            .store
            .get(id)
            .ok_or(InteractionError::UnknownAnnotation(id))?;
        let offered = AnnotationPopup::from_annotation(&annotation).dismiss;

        match action {
            UserAction::Apply { replacement } => {
                let change = doc.replace(annotation.range(), &replacement, EditOrigin::Suggestion)?;
                self.store.remove(id);
                self.sync_changes(doc);
                debug!(check = %annotation.issue.check, "replacement applied");
                Ok(ActionOutcome {
                    removed: vec![id],
                    change: Some(change),
                })
            }
            UserAction::Ignore => {
                if offered != DismissAction::Ignore {
                    return Err(InteractionError::ActionNotOffered {
                        action: DismissAction::Ignore,
                        check: annotation.issue.check.clone(),
                    });
                }
                self.ledger.ignore_range(annotation.from, annotation.to);
                self.store.remove(id);
                Ok(ActionOutcome {
                    removed: vec![id],
                    change: None,
                })
            }
            UserAction::AddToDictionary => {
                if offered != DismissAction::AddToDictionary {
                    return Err(InteractionError::ActionNotOffered {
                        action: DismissAction::AddToDictionary,
                        check: annotation.issue.check.clone(),
                    });
                }
                let term = if annotation.issue.matched.trim().is_empty() {
                    doc.slice(annotation.range()).unwrap_or_default()
                } else {
                    annotation.issue.matched.clone()
                };
                self.ledger.add_to_dictionary(term.as_str());
                let term = term.trim();

                let mut removed = vec![id];
                self.store.remove(id);
                removed.extend(
                    self.store
                        .remove_where(|issue| issue.matched.trim() == term)
                        .into_iter()
                        .map(|a| a.id),
                );
                info!(term, removed = removed.len(), "added to dictionary");
                Ok(ActionOutcome {
                    removed,
                    change: None,
                })
            }
        }
    }
}
