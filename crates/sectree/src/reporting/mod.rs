//! Scenario reporting.
//!
//! Every executed scenario leaves a [`ScenarioRecord`] in a global,
//! thread-safe collector so a harness can summarise a whole test binary
//! after the fact. Live progress is delivered through the [`Reporter`]
//! trait; [`LogReporter`] forwards it to the `log` facade.

use std::sync::{Mutex, MutexGuard, OnceLock};

mod record;
mod reporter;

pub use record::{AssertionRecord, RunRecord, RunStatus, ScenarioRecord, ScenarioStatus, Severity};
pub use reporter::{LogReporter, Reporter, SectionEnd};

/// Thread-safe store containing scenario records gathered during a test run.
static REPORTS: OnceLock<Mutex<Vec<ScenarioRecord>>> = OnceLock::new();

fn reports_mutex() -> &'static Mutex<Vec<ScenarioRecord>> {
    REPORTS.get_or_init(|| Mutex::new(Vec::new()))
}

fn lock_reports() -> MutexGuard<'static, Vec<ScenarioRecord>> {
    match reports_mutex().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Record a scenario outcome in the shared collector.
///
/// # Examples
/// ```
/// use sectree::reporting::{drain, record, ScenarioRecord, ScenarioStatus};
///
/// record(ScenarioRecord::new("scenario", "tests/demo.rs", 1, Vec::new(), 1, ScenarioStatus::Passed));
/// assert!(!drain().is_empty());
/// ```
pub fn record(record: ScenarioRecord) {
    lock_reports().push(record);
}

/// Retrieve a snapshot of the recorded scenarios without clearing them.
#[must_use]
pub fn snapshot() -> Vec<ScenarioRecord> {
    lock_reports().clone()
}

/// Remove and return all recorded scenario outcomes.
#[must_use]
pub fn drain() -> Vec<ScenarioRecord> {
    lock_reports().drain(..).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn passed(name: &str) -> ScenarioRecord {
        ScenarioRecord::new(
            name,
            "reporting.rs",
            1,
            Vec::new(),
            1,
            ScenarioStatus::Passed,
        )
    }

    #[test]
    #[serial(reporting)]
    fn drain_clears_records() {
        let _ = drain();
        record(passed("scenario"));
        assert_eq!(snapshot().len(), 1);
        let drained = drain();
        assert_eq!(drained.len(), 1);
        assert!(snapshot().is_empty());
    }

    #[test]
    #[serial(reporting)]
    fn skipped_records_keep_their_reason() {
        let _ = drain();
        record(ScenarioRecord::new(
            "hidden",
            "reporting.rs",
            7,
            vec!["slow".into()],
            0,
            ScenarioStatus::Skipped {
                reason: "excluded by tag filter".into(),
            },
        ));
        let records = drain();
        let Some(stored) = records.first() else {
            panic!("collector should retain the recorded skip");
        };
        assert_eq!(stored.runs(), 0);
        assert_eq!(stored.status().label(), "skipped");
        assert!(!stored.status().is_failure());
    }
}
