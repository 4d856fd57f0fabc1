//! Wrapping every run of a scenario in a harness.

use std::cell::{Cell, RefCell};

use sectree::harness::{RunAttempt, RunExecution, RunHarness};
use sectree::reporting::{RunRecord, RunStatus};
use sectree::{
    Scenario, ScenarioContext, ScenarioError, StdHarness, TrackerError, given, require, then,
};

thread_local! {
    static ACTIVE_RUN: Cell<usize> = const { Cell::new(0) };
}

/// Harness publishing the run index to the body and keeping a trace.
#[derive(Default)]
struct TracingHarness {
    attempts: RefCell<Vec<String>>,
    finished: RefCell<Vec<RunRecord>>,
}

impl RunHarness for TracingHarness {
    fn execute(&self, attempt: RunAttempt<'_>) -> RunExecution {
        self.attempts.borrow_mut().push(format!(
            "{} #{}",
            attempt.metadata().scenario_name(),
            attempt.index()
        ));
        ACTIVE_RUN.with(|run| run.set(attempt.index()));
        let execution = attempt.execute();
        ACTIVE_RUN.with(|run| run.set(0));
        execution
    }

    fn run_finished(&self, record: &RunRecord) {
        self.finished.borrow_mut().push(record.clone());
    }
}

fn grows(ctx: &ScenarioContext) {
    given!(ctx, "an empty vector", {
        let mut v: Vec<u8> = Vec::new();
        then!(ctx, "pushing grows it", {
            v.push(1);
            require!(ctx, v.len() == 1);
        });
        then!(ctx, "extending grows it more", {
            v.extend([1, 2, 3]);
            require!(ctx, v.len() == 3);
        });
    });
}

#[test]
fn harness_wraps_each_run() -> Result<(), ScenarioError> {
    let harness = TracingHarness::default();
    let mut seen = Vec::new();
    let report = Scenario::new("wrapped", file!(), line!()).run_in(&harness, |ctx| {
        seen.push(ACTIVE_RUN.with(Cell::get));
        grows(ctx);
    })?;

    assert!(report.passed());
    assert_eq!(seen, [1, 2]);
    assert_eq!(ACTIVE_RUN.with(Cell::get), 0);
    assert_eq!(harness.attempts.into_inner(), ["wrapped #1", "wrapped #2"]);
    let finished: Vec<String> = harness
        .finished
        .into_inner()
        .iter()
        .map(|record| format!("{} {}", record.index(), record.path()))
        .collect();
    assert_eq!(
        finished,
        [
            "1 Given: an empty vector / Then: pushing grows it",
            "2 Given: an empty vector / Then: extending grows it more",
        ]
    );
    Ok(())
}

#[derive(Default)]
struct UnwindCounter {
    unwound: Cell<usize>,
}

impl RunHarness for UnwindCounter {
    fn execute(&self, attempt: RunAttempt<'_>) -> RunExecution {
        let execution = attempt.execute();
        if execution.unwound() {
            self.unwound.set(self.unwound.get() + 1);
        }
        execution
    }
}

#[test]
fn failed_requirements_unwind_inside_the_harness() -> Result<(), ScenarioError> {
    let harness = UnwindCounter::default();
    let report = Scenario::new("unwinding", file!(), line!()).run_in(&harness, |ctx| {
        given!(ctx, "a requirement that fails", {
            require!(ctx, 1 + 1 == 3);
        });
        given!(ctx, "a requirement that holds", {
            require!(ctx, 1 + 1 == 2);
        });
    })?;

    assert_eq!(harness.unwound.get(), 1);
    let statuses: Vec<&RunStatus> = report.runs().iter().map(RunRecord::status).collect();
    assert!(matches!(
        statuses.as_slice(),
        [RunStatus::Aborted { .. }, RunStatus::Passed]
    ));
    Ok(())
}

#[test]
fn std_harness_matches_a_direct_run() -> Result<(), ScenarioError> {
    let direct = Scenario::new("direct", file!(), line!()).run(grows)?;
    let adapted = Scenario::new("adapted", file!(), line!()).run_in(&StdHarness, grows)?;

    let paths = |report: &sectree::ScenarioReport| -> Vec<String> {
        report.run_paths().iter().map(ToString::to_string).collect()
    };
    assert_eq!(paths(&direct), paths(&adapted));
    Ok(())
}

#[test]
fn tracker_errors_stop_before_the_next_attempt() {
    let harness = TracingHarness::default();
    let outcome = Scenario::new("limited", file!(), line!())
        .with_max_runs(1)
        .run_in(&harness, grows);

    assert!(matches!(
        outcome,
        Err(ScenarioError::Tracker {
            runs: 1,
            source: TrackerError::RunLimitExceeded { limit: 1 },
            ..
        })
    ));
    assert_eq!(harness.attempts.borrow().len(), 1);
    assert_eq!(harness.finished.borrow().len(), 1);
}
