//! Assertion verdicts and panic capture.
//!
//! Assertion macros evaluate their condition into a [`Verdict`] and hand it to
//! [`ScenarioContext::record`](crate::ScenarioContext::record). A failed
//! requirement stops the run by unwinding with a [`RequireFailure`] payload,
//! following the same pattern the tracker uses for fatal errors.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::panic_support::panic_message;
use crate::reporting::{AssertionRecord, Severity};
use crate::tracker::{SectionLocation, TrackerAbort};

/// Outcome of evaluating one assertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    passed: bool,
    message: Option<String>,
}

impl Verdict {
    /// A verdict that holds.
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            message: None,
        }
    }

    /// A failing verdict with an explanation.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: Some(message.into()),
        }
    }

    /// Converts a boolean condition.
    #[must_use]
    pub const fn from_bool(passed: bool) -> Self {
        Self {
            passed,
            message: None,
        }
    }

    /// Attaches a message regardless of the outcome.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Returns `true` when the assertion held.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.passed
    }

    /// Builds the record describing this verdict.
    #[must_use]
    pub fn into_record(
        self,
        macro_name: &'static str,
        severity: Severity,
        expression: &str,
        location: SectionLocation,
    ) -> AssertionRecord {
        let mut record =
            AssertionRecord::new(macro_name, severity, expression, self.passed, location);
        if let Some(message) = self.message {
            record = record.with_message(message);
        }
        record
    }
}

/// Unwind payload raised when a `require` assertion fails.
#[derive(Clone, Debug)]
pub struct RequireFailure {
    record: AssertionRecord,
}

impl RequireFailure {
    /// Wraps the failed record.
    #[must_use]
    pub const fn new(record: AssertionRecord) -> Self {
        Self { record }
    }

    /// Returns the failed record.
    #[must_use]
    pub const fn record(&self) -> &AssertionRecord {
        &self.record
    }

    /// Unwinds the current run with this failure.
    pub fn raise(record: AssertionRecord) -> ! {
        panic::resume_unwind(Box::new(Self::new(record)));
    }
}

impl fmt::Display for RequireFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}) failed at {}",
            self.record.macro_name(),
            self.record.expression(),
            self.record.location()
        )?;
        if let Some(message) = self.record.message() {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

/// Runs `f` and returns its panic payload, if any.
///
/// Payloads that control the scenario itself (failed requirements and tracker
/// aborts) are not captured; they keep unwinding to the scenario driver.
pub fn capture_panic<R>(f: impl FnOnce() -> R) -> Option<Box<dyn Any + Send>> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(_) => None,
        Err(payload) if payload.is::<TrackerAbort>() || payload.is::<RequireFailure>() => {
            panic::resume_unwind(payload)
        }
        Err(payload) => Some(payload),
    }
}

/// Verdict for an expression expected to panic.
pub fn panics<R>(f: impl FnOnce() -> R) -> Verdict {
    capture_panic(f).map_or_else(
        || Verdict::fail("expression did not panic"),
        |payload| Verdict::pass().with_message(panic_message(payload.as_ref())),
    )
}

/// Verdict for an expression expected to panic with a payload of type `E`.
///
/// # Examples
///
/// ```
/// use sectree::assertion::panics_as;
///
/// assert!(panics_as::<&str, ()>(|| std::panic::panic_any("boom")).passed());
/// assert!(!panics_as::<u32, ()>(|| std::panic::panic_any("boom")).passed());
/// ```
pub fn panics_as<E: Any, R>(f: impl FnOnce() -> R) -> Verdict {
    match capture_panic(f) {
        Some(payload) if payload.is::<E>() => {
            Verdict::pass().with_message(panic_message(payload.as_ref()))
        }
        Some(payload) => Verdict::fail(format!(
            "expected a `{}` payload, got: {}",
            std::any::type_name::<E>(),
            panic_message(payload.as_ref())
        )),
        None => Verdict::fail("expression did not panic"),
    }
}

/// Verdict for an expression expected to return normally.
pub fn no_panic<R>(f: impl FnOnce() -> R) -> Verdict {
    capture_panic(f).map_or_else(Verdict::pass, |payload| {
        Verdict::fail(panic_message(payload.as_ref()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::TrackerError;

    const AT: SectionLocation = SectionLocation::new("assertion.rs", 1);

    #[test]
    fn panics_passes_on_panic() {
        let verdict = panics(|| panic!("boom"));
        assert!(verdict.passed());
        let record = verdict.into_record("require_panics", Severity::Require, "f()", AT);
        assert_eq!(record.message(), Some("boom"));
    }

    #[test]
    fn panics_fails_without_panic() {
        assert_eq!(panics(|| 1 + 1), Verdict::fail("expression did not panic"));
    }

    #[test]
    fn no_panic_reports_payload() {
        assert_eq!(no_panic(|| panic!("late")), Verdict::fail("late"));
        assert!(no_panic(|| ()).passed());
    }

    #[test]
    fn wrong_payload_type_is_described() {
        let verdict = panics_as::<u32, ()>(|| panic!("text"));
        assert!(!verdict.passed());
        assert!(
            matches!(verdict.message.as_deref(), Some(m) if m.contains("u32") && m.contains("text"))
        );
    }

    #[test]
    fn scenario_payloads_are_not_captured() {
        let outer = panic::catch_unwind(|| {
            let _ = capture_panic::<()>(|| TrackerError::Exhausted.raise());
        });
        let Err(payload) = outer else {
            panic!("tracker aborts must keep unwinding");
        };
        assert!(payload.is::<TrackerAbort>());
    }

    #[test]
    fn require_failure_renders_location_and_message() {
        let record =
            Verdict::fail("3 != 4").into_record("require", Severity::Require, "a == b", AT);
        let failure = RequireFailure::new(record);
        assert_eq!(
            failure.to_string(),
            "require(a == b) failed at assertion.rs:1: 3 != 4"
        );
    }
}
