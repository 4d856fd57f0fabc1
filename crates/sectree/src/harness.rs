//! Per-run execution hooks.
//!
//! A scenario body is replayed once per leaf path. A [`RunHarness`] wraps
//! each of those replays, so an adapter can set up an environment (a runtime,
//! thread-local state, a timer) around the body and observe the resulting
//! [`RunRecord`]. [`StdHarness`] runs the body on the calling thread as is.

use std::fmt;
use std::thread;

use crate::reporting::RunRecord;

/// Identity of a scenario as seen by reporters and harnesses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioMetadata {
    scenario_name: String,
    source_file: &'static str,
    line: u32,
    tags: Vec<String>,
}

impl ScenarioMetadata {
    /// Describes the scenario declared at `source_file:line`.
    #[must_use]
    pub fn new(
        scenario_name: impl Into<String>,
        source_file: &'static str,
        line: u32,
        tags: Vec<String>,
    ) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            source_file,
            line,
            tags,
        }
    }

    /// Returns the scenario name.
    #[must_use]
    pub fn scenario_name(&self) -> &str {
        &self.scenario_name
    }

    /// Returns the file declaring the scenario.
    #[must_use]
    pub const fn source_file(&self) -> &'static str {
        self.source_file
    }

    /// Returns the line of the declaration.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Returns the visible and hidden tag names, without brackets.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// One pending replay of the scenario body.
///
/// The only way to obtain a [`RunExecution`] is [`execute`](Self::execute),
/// so a harness runs the body exactly once per attempt.
pub struct RunAttempt<'a> {
    metadata: &'a ScenarioMetadata,
    index: usize,
    body: &'a mut dyn FnMut() -> thread::Result<()>,
}

impl<'a> RunAttempt<'a> {
    pub(crate) fn new(
        metadata: &'a ScenarioMetadata,
        index: usize,
        body: &'a mut dyn FnMut() -> thread::Result<()>,
    ) -> Self {
        Self {
            metadata,
            index,
            body,
        }
    }

    /// Returns the scenario being run.
    #[must_use]
    pub const fn metadata(&self) -> &ScenarioMetadata {
        self.metadata
    }

    /// Returns the one-based index of this run.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Runs the body. Panics inside the body are caught and kept in the
    /// returned execution.
    pub fn execute(self) -> RunExecution {
        RunExecution((self.body)())
    }
}

impl fmt::Debug for RunAttempt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunAttempt")
            .field("scenario", &self.metadata.scenario_name())
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// Outcome of [`RunAttempt::execute`], handed back to the scenario driver.
#[must_use = "the driver needs the execution to close the run"]
pub struct RunExecution(thread::Result<()>);

impl RunExecution {
    /// Returns `true` when the body unwound, through a failed requirement or
    /// any other panic.
    #[must_use]
    pub const fn unwound(&self) -> bool {
        self.0.is_err()
    }

    pub(crate) fn into_result(self) -> thread::Result<()> {
        self.0
    }
}

impl fmt::Debug for RunExecution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunExecution")
            .field("unwound", &self.unwound())
            .finish()
    }
}

/// Wraps every run of a scenario.
///
/// # Examples
///
/// ```
/// use std::cell::Cell;
///
/// use sectree::harness::{RunAttempt, RunExecution, RunHarness};
/// use sectree::{section, Scenario};
///
/// #[derive(Default)]
/// struct Counting {
///     runs: Cell<usize>,
/// }
///
/// impl RunHarness for Counting {
///     fn execute(&self, attempt: RunAttempt<'_>) -> RunExecution {
///         self.runs.set(attempt.index());
///         attempt.execute()
///     }
/// }
///
/// let harness = Counting::default();
/// Scenario::new("counted", file!(), line!()).run_in(&harness, |ctx| {
///     section!(ctx, "a", {});
///     section!(ctx, "b", {});
/// })?;
/// assert_eq!(harness.runs.get(), 2);
/// # Ok::<(), sectree::ScenarioError>(())
/// ```
pub trait RunHarness {
    /// Executes one replay of the body. Implementations must return the
    /// execution produced by `attempt`.
    fn execute(&self, attempt: RunAttempt<'_>) -> RunExecution {
        attempt.execute()
    }

    /// Called once the run has been closed and described.
    fn run_finished(&self, _record: &RunRecord) {}
}

/// Harness running the body directly on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdHarness;

impl RunHarness for StdHarness {}

#[cfg(test)]
mod tests {
    use std::panic;

    use super::*;

    fn metadata() -> ScenarioMetadata {
        ScenarioMetadata::new("attempts", "harness.rs", 3, vec!["unit".into()])
    }

    #[test]
    fn attempt_runs_the_body_once() {
        let metadata = metadata();
        let mut calls = 0;
        let mut body = || -> thread::Result<()> {
            calls += 1;
            Ok(())
        };
        let attempt = RunAttempt::new(&metadata, 4, &mut body);
        assert_eq!(attempt.index(), 4);
        assert_eq!(attempt.metadata().tags(), ["unit"]);

        let execution = StdHarness.execute(attempt);
        assert!(!execution.unwound());
        assert!(execution.into_result().is_ok());
        assert_eq!(calls, 1);
    }

    #[test]
    fn caught_panics_stay_in_the_execution() {
        let metadata = metadata();
        let mut body =
            || -> thread::Result<()> { panic::catch_unwind(|| panic!("inside the body")) };
        let execution = RunAttempt::new(&metadata, 1, &mut body).execute();
        assert!(execution.unwound());
        assert_eq!(format!("{execution:?}"), "RunExecution { unwound: true }");
    }
}
