#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use stylecheck_core::{Issue, IssueAction, LintError, Linter, Severity};

type Responder = dyn Fn(&str) -> Result<Vec<Issue>, LintError> + Send + Sync;

/// Scripted linter: answers from a closure and counts invocations.
#[derive(Clone)]
pub struct FakeLinter {
    respond: Arc<Responder>,
    calls: Arc<AtomicUsize>,
}

impl FakeLinter {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&str) -> Vec<Issue> + Send + Sync + 'static,
    {
        Self {
            respond: Arc::new(move |text| Ok(respond(text))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(code: i32) -> Self {
        Self {
            respond: Arc::new(move |_| {
                Err(LintError::UnexpectedExit {
                    code: Some(code),
                    stderr: "E100 [vale] Runtime error".to_string(),
                })
            }),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer synchronously, for tests driving `begin`/`complete` by hand.
    pub fn lint_now(&self, text: &str) -> Result<Vec<Issue>, LintError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.respond)(text)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Linter for FakeLinter {
    fn lint(&self, text: &str) -> impl Future<Output = Result<Vec<Issue>, LintError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::ready((self.respond)(text))
    }
}

/// Linter whose answer never arrives.
#[derive(Clone, Copy)]
pub struct HangingLinter;

impl Linter for HangingLinter {
    fn lint(&self, _text: &str) -> impl Future<Output = Result<Vec<Issue>, LintError>> + Send {
        std::future::pending()
    }
}

pub fn issue(check: &str, line: usize, span: [usize; 2], matched: &str, severity: Severity) -> Issue {
    Issue {
        action: IssueAction::default(),
        span,
        offset: Vec::new(),
        check: check.to_string(),
        description: String::new(),
        link: String::new(),
        message: format!("{check}: '{matched}'"),
        severity,
        matched: matched.to_string(),
        line,
    }
}

/// Issues for every occurrence of `word` in `text`, reported line by line like the linter does.
pub fn find_word(text: &str, word: &str, check: &str, severity: Severity) -> Vec<Issue> {
    let mut issues = Vec::new();
    for (idx, line) in text.split('\n').enumerate() {
        let mut search = 0;
        while let Some(byte) = line[search..].find(word) {
            let byte = search + byte;
            let col = line[..byte].chars().count() + 1;
            let end = col + word.chars().count() - 1;
            issues.push(issue(check, idx + 1, [col, end], word, severity));
            search = byte + word.len();
        }
    }
    issues
}

pub fn too_wordy() -> Issue {
    let mut issue = issue(
        "write-good.TooWordy",
        1,
        [9, 17],
        "very good",
        Severity::Suggestion,
    );
    issue.action = IssueAction {
        name: "replace".to_string(),
        params: vec!["good".to_string(), "".to_string(), "great".to_string()],
    };
    issue
}
