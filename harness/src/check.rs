//! Response checkers and the report they write into.
//!
//! # Design
//! A `Checker` is a named function over the buffered body and response
//! metadata. The pipeline runs every checker against the same snapshot and
//! records each failure in a `Report`; one failing checker never stops the
//! ones after it. Tests surface the report through `Report::assert_passed`.

use std::borrow::Cow;
use std::fmt;

use tracing::warn;

use crate::http::{ResponseMeta, ResponseSnapshot};

type CheckFn = dyn Fn(&[u8], &ResponseMeta) -> Result<(), String> + Send + Sync;

/// A composable assertion over a buffered response.
pub struct Checker {
    name: String,
    check: Box<CheckFn>,
}

impl Checker {
    /// Wrap a custom check. `Err` carries the failure message.
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&[u8], &ResponseMeta) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Box::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check(&self, body: &[u8], meta: &ResponseMeta) -> Result<(), String> {
        (self.check)(body, meta)
    }
}

impl fmt::Debug for Checker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checker").field("name", &self.name).finish()
    }
}

/// Body decoded as UTF-8, with invalid sequences replaced.
fn body_text(body: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(body)
}

/// Fails unless the body, decoded as UTF-8, contains `text`.
pub fn check_body_contains(text: impl Into<String>) -> Checker {
    let text = text.into();
    Checker::new("body contains", move |body, _| {
        if body_text(body).contains(text.as_str()) {
            Ok(())
        } else {
            Err(format!("response body does not contain {text:?}"))
        }
    })
}

/// Fails unless the status code equals `expected`.
pub fn check_status(expected: u16) -> Checker {
    Checker::new("status", move |_, meta| {
        if meta.status == expected {
            Ok(())
        } else {
            Err(format!("expected status {expected}, got {}", meta.status))
        }
    })
}

/// Fails unless the body, decoded as UTF-8, equals `text` exactly.
pub fn check_body_equals(text: impl Into<String>) -> Checker {
    let text = text.into();
    Checker::new("body equals", move |body, _| {
        let actual = body_text(body);
        if actual == text {
            Ok(())
        } else {
            Err(format!("expected body {text:?}, got {actual:?}"))
        }
    })
}

/// Fails unless the named header is present with exactly `value`.
pub fn check_header(name: impl Into<String>, value: impl Into<String>) -> Checker {
    let name = name.into();
    let value = value.into();
    Checker::new("header", move |_, meta| match meta.header(&name) {
        Some(actual) if actual == value => Ok(()),
        Some(actual) => Err(format!(
            "expected header {name} to be {value:?}, got {actual:?}"
        )),
        None => Err(format!("response has no {name} header")),
    })
}

/// Fails unless the body parses as JSON equal to `expected`.
pub fn check_json(expected: serde_json::Value) -> Checker {
    Checker::new("json body", move |body, _| {
        let actual: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| format!("response body is not JSON: {e}"))?;
        if actual == expected {
            Ok(())
        } else {
            Err(format!("expected JSON {expected}, got {actual}"))
        }
    })
}

/// One assertion failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Name of the failing checker, or `"fetch"` for transport failures.
    pub source: String,
    pub message: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.source, self.message)
    }
}

/// Outcome of one request: every failure, plus how many checkers ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "a report does nothing unless its failures are asserted"]
pub struct Report {
    failures: Vec<Failure>,
    checks_run: usize,
}

impl Report {
    pub(crate) fn fetch_failed(message: impl fmt::Display) -> Self {
        let failure = Failure {
            source: "fetch".to_string(),
            message: format!("could not fetch response: {message}"),
        };
        warn!("{failure}");
        Self {
            failures: vec![failure],
            checks_run: 0,
        }
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn checks_run(&self) -> usize {
        self.checks_run
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Panic with every failure message if anything failed.
    #[track_caller]
    pub fn assert_passed(&self) {
        if self.passed() {
            return;
        }
        let messages: Vec<String> = self.failures.iter().map(ToString::to_string).collect();
        panic!(
            "{} assertion failure(s):\n  {}",
            messages.len(),
            messages.join("\n  ")
        );
    }
}

/// Run every checker, in order, against the same snapshot.
pub fn run_checks(snapshot: &ResponseSnapshot, checkers: &[Checker]) -> Report {
    let mut report = Report::default();
    for checker in checkers {
        report.checks_run += 1;
        if let Err(message) = checker.check(&snapshot.body, &snapshot.meta) {
            warn!(checker = checker.name(), "{message}");
            report.failures.push(Failure {
                source: checker.name().to_string(),
                message,
            });
        }
    }
    report
}
