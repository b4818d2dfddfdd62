mod common;

use common::{FakeLinter, HangingLinter, find_word, issue, too_wordy};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use stylecheck_core::{
    CycleStart, DetectError, DetectionStatus, Detector, Document, EditOrigin, OutcomeSource,
    Settings, Severity, TextDocument, Trigger, UserAction,
};

const SENTENCE: &str = "This is very good.";

fn wordy_detector(settings: Settings) -> (Detector<FakeLinter>, FakeLinter) {
    let linter = FakeLinter::new(|text| {
        if text == SENTENCE {
            vec![too_wordy()]
        } else {
            Vec::new()
        }
    });
    (Detector::new(linter.clone(), settings), linter)
}

#[tokio::test]
async fn test_end_to_end_creates_one_annotation() {
    let (mut detector, _) = wordy_detector(Settings::default());
    let mut doc = TextDocument::new(SENTENCE);

    let outcome = detector.run(&mut doc, Trigger::Command).await.unwrap();
    assert_eq!(outcome.source, OutcomeSource::Linter);
    assert_eq!(outcome.added.len(), 1);

    let annotations = detector.store().annotations();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].range(), 8..17);
    assert_eq!(annotations[0].issue.check, "write-good.TooWordy");
    assert_eq!(doc.slice(8..17).as_deref(), Some("very good"));
}

#[tokio::test]
async fn test_suppressed_rule_creates_nothing() {
    let settings = Settings {
        ignore_rules: vec!["write-good.TooWordy".to_string()],
        ..Settings::default()
    };
    let (mut detector, _) = wordy_detector(settings);
    let mut doc = TextDocument::new(SENTENCE);

    let outcome = detector.run(&mut doc, Trigger::Command).await.unwrap();
    assert_eq!(outcome.issues.len(), 1);
    assert_eq!(outcome.skipped.suppressed, 1);
    assert!(detector.store().is_empty());
}

#[tokio::test]
async fn test_severity_floor_filters() {
    let settings = Settings {
        min_alert_level: Severity::Warning,
        ..Settings::default()
    };
    let (mut detector, _) = wordy_detector(settings);
    let mut doc = TextDocument::new(SENTENCE);

    let outcome = detector.run(&mut doc, Trigger::Command).await.unwrap();
    assert_eq!(outcome.skipped.below_floor, 1);
    assert!(detector.store().is_empty());
}

#[tokio::test]
async fn test_unchanged_text_is_served_from_cache() {
    let (mut detector, linter) = wordy_detector(Settings::default());
    let mut doc = TextDocument::new(SENTENCE);

    let first = detector.run(&mut doc, Trigger::Command).await.unwrap();
    let before = detector.store().annotations();
    let second = detector.run(&mut doc, Trigger::Command).await.unwrap();

    assert_eq!(linter.calls(), 1);
    assert_eq!(second.source, OutcomeSource::Cache);
    assert_eq!(second.issues, first.issues);
    assert!(second.added.is_empty());
    assert_eq!(detector.store().annotations(), before);
}

#[tokio::test]
async fn test_clearing_invalidates_the_cache() {
    let (mut detector, linter) = wordy_detector(Settings::default());
    let mut doc = TextDocument::new(SENTENCE);

    detector.run(&mut doc, Trigger::Command).await.unwrap();
    assert_eq!(detector.clear_annotations(), 1);
    assert!(detector.cache().is_empty());

    detector.run(&mut doc, Trigger::Command).await.unwrap();
    assert_eq!(linter.calls(), 2);
    assert_eq!(detector.store().len(), 1);
}

#[tokio::test]
async fn test_out_of_bound_lines_are_dropped_not_fatal() {
    let linter = FakeLinter::new(|_| {
        vec![
            issue("Vale.Repetition", 7, [1, 3], "the", Severity::Error),
            issue("Vale.Repetition", 2, [1, 3], "two", Severity::Error),
            issue("Vale.Repetition", 1, [0, 2], "on", Severity::Error),
        ]
    });
    let mut detector = Detector::new(linter, Settings::default());
    let mut doc = TextDocument::new("one\ntwo");

    let outcome = detector.run(&mut doc, Trigger::Command).await.unwrap();
    assert_eq!(outcome.skipped.unmapped, 2);
    assert_eq!(outcome.added.len(), 1);
    assert_eq!(detector.store().annotations()[0].range(), 4..7);
}

#[tokio::test]
async fn test_duplicate_positions_keep_the_first_issue() {
    let linter = FakeLinter::new(|_| {
        vec![
            issue("first.Rule", 1, [1, 4], "This", Severity::Warning),
            issue("second.Rule", 1, [1, 4], "This", Severity::Error),
        ]
    });
    let mut detector = Detector::new(linter, Settings::default());
    let mut doc = TextDocument::new(SENTENCE);

    let outcome = detector.run(&mut doc, Trigger::Command).await.unwrap();
    assert_eq!(outcome.skipped.duplicate, 1);
    assert_eq!(detector.popup_at(0).unwrap().title, "first.Rule");
}

#[tokio::test]
async fn test_code_spans_are_not_annotated() {
    let text = "Run `very good` and very good.";
    let linter = FakeLinter::new(|text| find_word(text, "very good", "write-good.TooWordy", Severity::Warning));
    let mut detector = Detector::new(linter, Settings::default());
    let mut doc = TextDocument::new(text);

    let outcome = detector.run(&mut doc, Trigger::Command).await.unwrap();
    assert_eq!(outcome.issues.len(), 2);
    assert_eq!(outcome.skipped.not_checkable, 1);
    assert_eq!(detector.store().annotations()[0].range(), 20..29);
}

#[tokio::test]
async fn test_selection_only_replaces_annotations_inside_it() {
    let text = "teh start\nmiddle line\nteh end";
    let linter = FakeLinter::new(|text| find_word(text, "teh", "Vale.Spelling", Severity::Error));
    let mut detector = Detector::new(linter, Settings::default());
    let mut doc = TextDocument::new(text);

    detector.run(&mut doc, Trigger::Command).await.unwrap();
    assert_eq!(detector.store().len(), 2);

    // Re-check only the last line: the first annotation must survive and the new one must be
    // placed with the selection's base offset.
    let last_line = doc.line_range(2).unwrap();
    doc.set_selection(Some(last_line.clone()));
    let outcome = detector.run(&mut doc, Trigger::Command).await.unwrap();
    assert_eq!(outcome.added.len(), 1);

    let ranges: Vec<_> = detector.store().annotations().iter().map(|a| a.range()).collect();
    assert_eq!(ranges, vec![0..3, last_line.start..last_line.start + 3]);
}

#[tokio::test]
async fn test_explicit_range_must_fit() {
    let (mut detector, _) = wordy_detector(Settings::default());
    let mut doc = TextDocument::new(SENTENCE);
    let err = detector
        .run(&mut doc, Trigger::Range(10..400))
        .await
        .unwrap_err();
    assert!(matches!(err, DetectError::InvalidRange { .. }));
}

#[tokio::test]
async fn test_linter_failure_keeps_existing_annotations() {
    let (mut detector, _) = wordy_detector(Settings::default());
    let mut doc = TextDocument::new(SENTENCE);
    detector.run(&mut doc, Trigger::Command).await.unwrap();

    let mut failing = Detector::new(FakeLinter::failing(2), Settings::default());
    let mut doc2 = TextDocument::new(SENTENCE);
    let err = failing.run(&mut doc2, Trigger::Command).await.unwrap_err();
    assert!(matches!(err, DetectError::Lint(_)));
    assert_eq!(failing.status(), DetectionStatus::Ready);
    assert!(failing.cache().is_empty());

    // A failing cycle in the middle of a session must not touch earlier annotations.
    let request = match detector.begin(&doc, Trigger::Range(0..4)).unwrap() {
        CycleStart::Lint(request) => request,
        other => panic!("expected a lint request, got {other:?}"),
    };
    let failure = Err(stylecheck_core::LintError::UnexpectedExit {
        code: Some(2),
        stderr: String::new(),
    });
    assert!(detector.complete(&doc, request, failure).is_err());
    assert_eq!(detector.store().len(), 1);
}

#[tokio::test]
async fn test_status_transitions_are_observable() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (mut detector, _) = wordy_detector(Settings::default());
    let sink = Arc::clone(&seen);
    detector.subscribe_status(move |status| sink.lock().unwrap().push(status));

    let mut doc = TextDocument::new(SENTENCE);
    detector.run(&mut doc, Trigger::Command).await.unwrap();
    detector.run(&mut doc, Trigger::Command).await.unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            DetectionStatus::Working,
            DetectionStatus::Ready,
            DetectionStatus::Working,
            DetectionStatus::Ready,
        ]
    );
}

#[tokio::test]
async fn test_edited_target_discards_late_result() {
    let (mut detector, linter) = wordy_detector(Settings::default());
    let mut doc = TextDocument::new(SENTENCE);

    let request = match detector.begin(&doc, Trigger::Command).unwrap() {
        CycleStart::Lint(request) => request,
        other => panic!("expected a lint request, got {other:?}"),
    };
    let result = linter.lint_now(&request.text);

    doc.insert(0, "Well, ", EditOrigin::Input).unwrap();
    detector.sync_changes(&mut doc);

    let outcome = detector.complete(&doc, request, result).unwrap();
    assert!(outcome.discarded);
    assert!(detector.store().is_empty());
    assert!(detector.cache().is_empty());
    assert_eq!(detector.status(), DetectionStatus::Ready);
}

#[tokio::test]
async fn test_discarded_result_is_not_served_after_text_returns() {
    let (mut detector, linter) = wordy_detector(Settings::default());
    let mut doc = TextDocument::new(SENTENCE);

    let CycleStart::Lint(request) = detector.begin(&doc, Trigger::Command).unwrap() else {
        panic!("expected a lint request");
    };
    let result = linter.lint_now(&request.text);

    // Type a character and take it back: the text is identical again.
    doc.insert(18, "x", EditOrigin::Input).unwrap();
    doc.delete(18..19, EditOrigin::Input).unwrap();
    detector.sync_changes(&mut doc);
    assert_eq!(doc.text(), SENTENCE);
    assert!(detector.complete(&doc, request, result).unwrap().discarded);

    let outcome = detector.run(&mut doc, Trigger::Command).await.unwrap();
    assert_eq!(outcome.source, OutcomeSource::Linter);
    assert_eq!(detector.store().len(), 1);
    assert_eq!(linter.calls(), 2);
}

#[tokio::test]
async fn test_dropped_request_does_not_pin_status() {
    let (mut detector, linter) = wordy_detector(Settings::default());
    let mut doc = TextDocument::new(SENTENCE);

    let CycleStart::Lint(dropped) = detector.begin(&doc, Trigger::Command).unwrap() else {
        panic!("expected a lint request");
    };
    let dropped_cycle = dropped.cycle;
    drop(dropped);
    assert_eq!(detector.status(), DetectionStatus::Working);

    doc.insert(0, "Well, ", EditOrigin::Input).unwrap();
    let outcome = detector.run(&mut doc, Trigger::Command).await.unwrap();
    assert!(!outcome.discarded);
    assert_eq!(linter.calls(), 1);
    assert_eq!(detector.in_flight(), 0);
    assert_eq!(detector.status(), DetectionStatus::Ready);
    assert!(!detector.abandon(dropped_cycle));
}

#[tokio::test]
async fn test_abandoned_cycle_settles_and_late_result_is_discarded() {
    let (mut detector, linter) = wordy_detector(Settings::default());
    let doc = TextDocument::new(SENTENCE);

    let CycleStart::Lint(request) = detector.begin(&doc, Trigger::Command).unwrap() else {
        panic!("expected a lint request");
    };
    assert!(detector.abandon(request.cycle));
    assert_eq!(detector.in_flight(), 0);
    assert_eq!(detector.status(), DetectionStatus::Ready);

    let late = detector.complete(&doc, request, linter.lint_now(SENTENCE)).unwrap();
    assert!(late.discarded);
    assert!(detector.store().is_empty());
    assert!(detector.cache().is_empty());
}

#[tokio::test]
async fn test_request_from_another_detector_is_rejected() {
    let (mut issuer, linter) = wordy_detector(Settings::default());
    let (mut other, _) = wordy_detector(Settings::default());
    let doc = TextDocument::new(SENTENCE);

    let CycleStart::Lint(request) = issuer.begin(&doc, Trigger::Command).unwrap() else {
        panic!("expected a lint request");
    };
    let result = linter.lint_now(&request.text);
    let err = other.complete(&doc, request, result).unwrap_err();
    assert!(matches!(err, DetectError::UnknownCycle(_)));
}

#[tokio::test]
async fn test_cancelled_run_releases_its_cycle() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut detector = Detector::new(HangingLinter, Settings::default());
    let sink = Arc::clone(&seen);
    detector.subscribe_status(move |status| sink.lock().unwrap().push(status));
    let mut doc = TextDocument::new(SENTENCE);

    let finished = tokio::select! {
        biased;
        outcome = detector.run(&mut doc, Trigger::Command) => Some(outcome),
        () = std::future::ready(()) => None,
    };
    assert!(finished.is_none());
    assert_eq!(detector.in_flight(), 0);
    assert_eq!(detector.status(), DetectionStatus::Ready);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![DetectionStatus::Working, DetectionStatus::Ready]
    );
}

#[tokio::test]
async fn test_newer_overlapping_cycle_supersedes_older() {
    let (mut detector, linter) = wordy_detector(Settings::default());
    let doc = TextDocument::new(SENTENCE);

    let CycleStart::Lint(older) = detector.begin(&doc, Trigger::Range(0..18)).unwrap() else {
        panic!("expected a lint request");
    };
    let CycleStart::Lint(newer) = detector.begin(&doc, Trigger::Range(5..12)).unwrap() else {
        panic!("expected a lint request");
    };
    assert!(newer.cycle > older.cycle);
    assert_eq!(detector.in_flight(), 1);

    let newer_result = linter.lint_now(&newer.text);
    let older_result = linter.lint_now(&older.text);
    assert!(!detector.complete(&doc, newer, newer_result).unwrap().discarded);
    let late = detector.complete(&doc, older, older_result).unwrap();
    assert!(late.discarded);
    assert!(detector.store().is_empty());
    assert_eq!(detector.status(), DetectionStatus::Ready);
}

#[tokio::test]
async fn test_unrelated_edit_re_anchors_in_flight_range() {
    let text = "Intro line.\nThis is very good.";
    let linter = FakeLinter::new(|text| find_word(text, "very good", "write-good.TooWordy", Severity::Warning));
    let mut detector = Detector::new(linter.clone(), Settings::default());
    let mut doc = TextDocument::new(text);

    let target = doc.line_range(1).unwrap();
    let CycleStart::Lint(request) = detector.begin(&doc, Trigger::Range(target)).unwrap() else {
        panic!("expected a lint request");
    };
    let result = linter.lint_now(&request.text);

    doc.insert(0, "An ", EditOrigin::Input).unwrap();
    detector.sync_changes(&mut doc);
    let outcome = detector.complete(&doc, request, result).unwrap();
    assert!(!outcome.discarded);

    let annotation = &detector.store().annotations()[0];
    assert_eq!(doc.slice(annotation.range()).as_deref(), Some("very good"));
}

#[tokio::test]
async fn test_dictionary_suppresses_term_everywhere() {
    let linter = FakeLinter::new(|text| find_word(text, "teh", "Vale.Spelling", Severity::Error));
    let mut detector = Detector::new(linter, Settings::default());
    let mut doc = TextDocument::new("I saw teh cat.");

    detector.run(&mut doc, Trigger::Command).await.unwrap();
    let popup = detector.popup_at(7).unwrap();
    let outcome = detector
        .perform(&mut doc, popup.annotation, UserAction::AddToDictionary)
        .unwrap();
    assert_eq!(outcome.removed, vec![popup.annotation]);
    assert!(detector.ledger().contains_term("teh"));

    doc.insert(doc.len_chars(), "\nAnd teh dog, teh bird.", EditOrigin::Paste)
        .unwrap();
    let outcome = detector.run(&mut doc, Trigger::Command).await.unwrap();
    assert_eq!(outcome.issues.len(), 3);
    assert_eq!(outcome.skipped.in_dictionary, 3);
    assert!(detector.store().is_empty());
}

#[tokio::test]
async fn test_ignored_range_is_not_resurfaced() {
    let linter = FakeLinter::new(|text| find_word(text, "very", "write-good.Weasel", Severity::Warning));
    let mut detector = Detector::new(linter, Settings::default());
    let mut doc = TextDocument::new("It is very very good.");

    detector.run(&mut doc, Trigger::Command).await.unwrap();
    assert_eq!(detector.store().len(), 2);

    let popup = detector.popup_at(6).unwrap();
    detector
        .perform(&mut doc, popup.annotation, UserAction::Ignore)
        .unwrap();
    assert_eq!(detector.store().len(), 1);

    detector.clear_annotations();
    let outcome = detector.run(&mut doc, Trigger::Command).await.unwrap();
    assert_eq!(outcome.skipped.ignored, 1);
    let ranges: Vec<_> = detector.store().annotations().iter().map(|a| a.range()).collect();
    assert_eq!(ranges, vec![11..15]);
}

#[tokio::test]
async fn test_surviving_annotations_respect_the_ledger() {
    let linter = FakeLinter::new(|text| {
        let mut issues = find_word(text, "teh", "Vale.Spelling", Severity::Error);
        issues.extend(find_word(text, "very", "write-good.Weasel", Severity::Warning));
        issues
    });
    let mut detector = Detector::new(linter, Settings::default());
    detector.ledger_mut().add_to_dictionary("teh");
    detector.ledger_mut().ignore_range(4, 8);
    let mut doc = TextDocument::new("teh very big, very teh.");

    detector.run(&mut doc, Trigger::Command).await.unwrap();
    for annotation in detector.store().annotations() {
        assert!(!detector.ledger().is_ignored(annotation.from, annotation.to));
        assert!(!detector.ledger().contains_term(&annotation.issue.matched));
    }
    assert_eq!(detector.store().len(), 1);
}

#[tokio::test]
async fn test_auto_check_lints_only_dirty_lines() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let linter = FakeLinter::new(move |text| {
        sink.lock().unwrap().push(text.to_string());
        Vec::new()
    });
    let settings = Settings {
        should_auto_check: true,
        ..Settings::default()
    };
    let mut detector = Detector::new(linter.clone(), settings);
    let mut doc = TextDocument::new("first line\nsecond line\nthird line");

    let now = Instant::now();
    for change in [
        doc.insert(11, "my ", EditOrigin::Input).unwrap(),
        doc.insert(14, "x", EditOrigin::Input).unwrap(),
    ] {
        detector.on_change(&change, now);
    }
    doc.take_changes();

    assert!(!detector.auto_check_due(now + Duration::from_millis(100)));
    assert!(detector.auto_check_due(now + Duration::from_secs(3)));

    detector.run(&mut doc, Trigger::Auto).await.unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["my xsecond line".to_string()]);

    // Nothing pending: the next automatic trigger is a no-op.
    let outcome = detector.run(&mut doc, Trigger::Auto).await.unwrap();
    assert_eq!(outcome.source, OutcomeSource::Nothing);
    assert_eq!(linter.calls(), 1);
}

#[tokio::test]
async fn test_programmatic_edits_do_not_queue_auto_checks() {
    let settings = Settings {
        should_auto_check: true,
        ..Settings::default()
    };
    let (mut detector, _) = wordy_detector(settings);
    let mut doc = TextDocument::new(SENTENCE);
    doc.insert(0, "x", EditOrigin::Other).unwrap();
    detector.sync_changes(&mut doc);
    assert!(!detector.auto_check().has_pending());

    doc.insert(0, "y", EditOrigin::Input).unwrap();
    detector.sync_changes(&mut doc);
    assert!(detector.auto_check().has_pending());

    assert!(!detector.toggle_auto_check());
    assert!(!detector.auto_check().has_pending());
}
