//! Scenario driver.
//!
//! A [`Scenario`] owns the section tracker for one test case and calls the
//! body once per leaf path. Each run is isolated with `catch_unwind`, so a
//! failed requirement or a stray panic ends only that run; fatal tracker
//! errors end the whole scenario.

use std::any::Any;
use std::fmt::Write as _;
use std::panic::{self, AssertUnwindSafe};

use log::{debug, info};
use thiserror::Error;

use crate::assertion::RequireFailure;
use crate::config;
use crate::context::ScenarioContext;
use crate::harness::{RunAttempt, RunHarness, ScenarioMetadata, StdHarness};
use crate::panic_support::panic_message;
use crate::reporting::{
    self, AssertionRecord, LogReporter, Reporter, RunRecord, RunStatus, ScenarioRecord,
    ScenarioStatus, Severity,
};
use crate::section::SectionKind;
use crate::tags::{self, TagError, TagFilter, Tags};
use crate::tracker::{
    RunEnd, SectionKey, SectionLocation, SectionPath, SectionTracker, TrackerAbort, TrackerError,
};

/// Errors surfaced by the scenario driver.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScenarioError {
    /// The scenario's tag string could not be parsed.
    #[error("invalid tags for scenario '{scenario}': {source}")]
    Tags {
        /// Scenario name.
        scenario: String,
        /// Parser error.
        #[source]
        source: TagError,
    },
    /// The section tracker hit a fatal error; exploration stopped.
    #[error("scenario '{scenario}' stopped after {runs} run(s): {source}")]
    Tracker {
        /// Scenario name.
        scenario: String,
        /// Runs started before the error.
        runs: usize,
        /// Tracker error.
        #[source]
        source: TrackerError,
    },
    /// At least one run failed.
    #[error("scenario '{scenario}' failed in {failed_runs} run(s):\n{summary}")]
    Failed {
        /// Scenario name.
        scenario: String,
        /// Number of failed runs.
        failed_runs: usize,
        /// One line per failed assertion or aborted run.
        summary: String,
    },
}

/// A test case made of nested sections, run once per leaf path.
///
/// # Examples
///
/// ```
/// use sectree::{given, then, when, Scenario};
///
/// let report = Scenario::new("a vector grows", file!(), line!()).run(|ctx| {
///     given!(ctx, "an empty vector", {
///         let mut v: Vec<i32> = Vec::new();
///         when!(ctx, "an element is pushed", {
///             v.push(1);
///             then!(ctx, "the length is one", {
///                 sectree::require!(ctx, v.len() == 1);
///             });
///         });
///     });
/// })?;
/// assert!(report.passed());
/// # Ok::<(), sectree::ScenarioError>(())
/// ```
pub struct Scenario {
    name: String,
    location: SectionLocation,
    tags: Tags,
    max_runs: Option<usize>,
    filter: Option<TagFilter>,
    reporter: Box<dyn Reporter>,
}

impl Scenario {
    /// Declares a scenario at `file:line`.
    #[must_use]
    pub fn new(name: impl Into<String>, file: &'static str, line: u32) -> Self {
        Self {
            name: name.into(),
            location: SectionLocation::new(file, line),
            tags: Tags::default(),
            max_runs: None,
            filter: None,
            reporter: Box::new(LogReporter),
        }
    }

    /// Parses and attaches a tag string such as `"[vector][bdd]"`.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Tags`] when the tag string is malformed.
    pub fn tagged(mut self, tags: &str) -> Result<Self, ScenarioError> {
        self.tags = Tags::parse(tags).map_err(|source| ScenarioError::Tags {
            scenario: self.name.clone(),
            source,
        })?;
        Ok(self)
    }

    /// Attaches already parsed tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Overrides the configured run ceiling for this scenario.
    #[must_use]
    pub fn with_max_runs(mut self, max_runs: usize) -> Self {
        self.max_runs = Some(max_runs);
        self
    }

    /// Uses `filter` instead of the configured tag filter.
    #[must_use]
    pub fn with_filter(mut self, filter: TagFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Replaces the default [`LogReporter`].
    #[must_use]
    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// Returns the scenario name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the scenario tags.
    #[must_use]
    pub const fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Describes the scenario for reporters and harnesses.
    #[must_use]
    pub fn metadata(&self) -> ScenarioMetadata {
        ScenarioMetadata::new(
            self.name.clone(),
            self.location.file(),
            self.location.line(),
            self.tags.names(),
        )
    }

    /// Runs `body` until every leaf path has been traversed.
    ///
    /// Failed assertions and panics are collected in the returned report;
    /// use [`ScenarioReport::ensure_passed`] to turn them into an error.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Tracker`] when the section tree changed
    /// between runs, the run ceiling was reached or sections were misused.
    pub fn run<B>(self, body: B) -> Result<ScenarioReport, ScenarioError>
    where
        B: FnMut(&ScenarioContext),
    {
        self.run_in(&StdHarness, body)
    }

    /// Runs `body` with a fixture built fresh by `init` for every run.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub fn run_with_fixture<F, I, B>(
        self,
        mut init: I,
        mut body: B,
    ) -> Result<ScenarioReport, ScenarioError>
    where
        I: FnMut() -> F,
        B: FnMut(&ScenarioContext, &mut F),
    {
        self.run(|ctx| {
            let mut fixture = init();
            body(ctx, &mut fixture);
        })
    }

    /// Runs `body` like [`run`](Self::run), letting `harness` wrap every
    /// replay of the body.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub fn run_in<H, B>(self, harness: &H, mut body: B) -> Result<ScenarioReport, ScenarioError>
    where
        H: RunHarness + ?Sized,
        B: FnMut(&ScenarioContext),
    {
        let metadata = self.metadata();
        let filter = self.filter.or_else(config::tag_filter);
        let mut reporter = self.reporter;

        if !tags::selected(&self.tags, filter.as_ref()) {
            info!("scenario '{}' skipped by tag filter", self.name);
            let report = ScenarioReport::new(
                metadata,
                Vec::new(),
                Vec::new(),
                ScenarioStatus::Skipped {
                    reason: "excluded by tag filter".into(),
                },
            );
            let record = report.record();
            reporter.scenario_ended(&record);
            reporting::record(record);
            return Ok(report);
        }

        reporter.scenario_started(&metadata);
        let root = SectionKey::new(SectionKind::Scenario.label(&self.name), self.location);
        let tracker =
            SectionTracker::new(root).with_max_runs(self.max_runs.unwrap_or_else(config::max_runs));
        let context = ScenarioContext::new(tracker, reporter);

        let mut runs = Vec::new();
        let outcome = loop {
            if context.run_complete() {
                break Ok(());
            }
            let index = match context.begin_run() {
                Ok(index) => index,
                Err(error) => break Err(error),
            };
            let mut replay = || panic::catch_unwind(AssertUnwindSafe(|| body(&context)));
            let execution = harness.execute(RunAttempt::new(&metadata, index, &mut replay));
            match finish_run(&context, self.location, execution.into_result()) {
                Ok(record) => {
                    harness.run_finished(&record);
                    context.with_reporter(|reporter| reporter.run_ended(&record));
                    runs.push(record);
                }
                Err(error) => break Err(error),
            }
        };

        let status = match &outcome {
            Ok(()) => match runs.iter().filter(|run| run.is_failure()).count() {
                0 => ScenarioStatus::Passed,
                failed_runs => ScenarioStatus::Failed { failed_runs },
            },
            Err(error) => ScenarioStatus::Errored {
                message: error.to_string(),
            },
        };
        let started = context.run_index();
        let report_record = ScenarioRecord::new(
            metadata.scenario_name(),
            metadata.source_file(),
            metadata.line(),
            metadata.tags().to_vec(),
            started,
            status.clone(),
        );
        context.with_reporter(|reporter| reporter.scenario_ended(&report_record));
        reporting::record(report_record);

        let leaf_paths = context.into_tracker().leaf_paths();
        match outcome {
            Ok(()) => Ok(ScenarioReport::new(metadata, runs, leaf_paths, status)),
            Err(source) => Err(ScenarioError::Tracker {
                scenario: self.name,
                runs: started,
                source,
            }),
        }
    }
}

/// Entry point of tests generated by [`scenario!`](crate::scenario!).
///
/// # Panics
///
/// Panics with the rendered [`ScenarioError`] when the scenario fails.
#[doc(hidden)]
pub fn run_declared<B>(name: &'static str, tags: &str, file: &'static str, line: u32, body: B)
where
    B: FnMut(&ScenarioContext),
{
    let outcome = Scenario::new(name, file, line)
        .tagged(tags)
        .and_then(|scenario| scenario.run(body))
        .and_then(ScenarioReport::ensure_passed);
    if let Err(error) = outcome {
        panic!("{error}");
    }
}

/// Fixture-taking variant of [`run_declared`].
///
/// # Panics
///
/// Panics with the rendered [`ScenarioError`] when the scenario fails.
#[doc(hidden)]
pub fn run_declared_with_fixture<F, I, B>(
    name: &'static str,
    tags: &str,
    file: &'static str,
    line: u32,
    init: I,
    body: B,
) where
    I: FnMut() -> F,
    B: FnMut(&ScenarioContext, &mut F),
{
    let outcome = Scenario::new(name, file, line)
        .tagged(tags)
        .and_then(|scenario| scenario.run_with_fixture(init, body))
        .and_then(ScenarioReport::ensure_passed);
    if let Err(error) = outcome {
        panic!("{error}");
    }
}

/// Closes the active run and describes it.
fn finish_run(
    context: &ScenarioContext,
    scenario_location: SectionLocation,
    result: Result<(), Box<dyn Any + Send>>,
) -> Result<RunRecord, TrackerError> {
    let failure = match result {
        Ok(()) => None,
        Err(payload) => match payload.downcast::<TrackerAbort>() {
            Ok(abort) => return Err(context.take_fatal().unwrap_or_else(|| abort.into_error())),
            Err(payload) => Some(payload),
        },
    };
    if let Some(fatal) = context.take_fatal() {
        return Err(fatal);
    }

    let index = context.run_index();
    let Some(payload) = failure else {
        let path = context.end_run(RunEnd::Completed)?;
        let assertions = context.take_assertions();
        let status = if assertions.iter().any(AssertionRecord::is_failure) {
            RunStatus::Failed
        } else {
            RunStatus::Passed
        };
        return Ok(RunRecord::new(index, path, assertions, status));
    };

    let path = context.end_run(RunEnd::Aborted)?;
    let reason = payload.downcast_ref::<RequireFailure>().map_or_else(
        || {
            let message = panic_message(payload.as_ref());
            debug!("run {index} panicked: {message}");
            context.push_record(unexpected_panic(&path, scenario_location, &message));
            format!("unexpected panic: {message}")
        },
        ToString::to_string,
    );
    Ok(RunRecord::new(
        index,
        path,
        context.take_assertions(),
        RunStatus::Aborted { reason },
    ))
}

fn unexpected_panic(
    path: &SectionPath,
    fallback: SectionLocation,
    message: &str,
) -> AssertionRecord {
    let location = path.leaf().map_or(fallback, SectionKey::location);
    AssertionRecord::new("unexpected panic", Severity::Require, "", false, location)
        .with_message(message)
        .with_section(path.clone())
}

/// Everything a scenario did across its runs.
#[derive(Clone, Debug)]
pub struct ScenarioReport {
    metadata: ScenarioMetadata,
    runs: Vec<RunRecord>,
    leaf_paths: Vec<SectionPath>,
    status: ScenarioStatus,
}

impl ScenarioReport {
    fn new(
        metadata: ScenarioMetadata,
        runs: Vec<RunRecord>,
        leaf_paths: Vec<SectionPath>,
        status: ScenarioStatus,
    ) -> Self {
        Self {
            metadata,
            runs,
            leaf_paths,
            status,
        }
    }

    /// Returns the scenario metadata.
    #[must_use]
    pub const fn metadata(&self) -> &ScenarioMetadata {
        &self.metadata
    }

    /// Returns one record per run, in execution order.
    #[must_use]
    pub fn runs(&self) -> &[RunRecord] {
        &self.runs
    }

    /// Returns the path traversed by each run.
    #[must_use]
    pub fn run_paths(&self) -> Vec<&SectionPath> {
        self.runs.iter().map(RunRecord::path).collect()
    }

    /// Returns every leaf of the discovered section tree.
    #[must_use]
    pub fn leaf_paths(&self) -> &[SectionPath] {
        &self.leaf_paths
    }

    /// Returns the scenario status.
    #[must_use]
    pub const fn status(&self) -> &ScenarioStatus {
        &self.status
    }

    /// Returns `true` unless a run failed. Skipped scenarios count as passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        !self.status.is_failure()
    }

    /// Iterates over every assertion that failed the scenario.
    pub fn failures(&self) -> impl Iterator<Item = &AssertionRecord> {
        self.runs.iter().flat_map(RunRecord::failures)
    }

    /// Summarises the report for the collector.
    #[must_use]
    pub fn record(&self) -> ScenarioRecord {
        ScenarioRecord::new(
            self.metadata.scenario_name(),
            self.metadata.source_file(),
            self.metadata.line(),
            self.metadata.tags().to_vec(),
            self.runs.len(),
            self.status.clone(),
        )
    }

    /// Converts a failed report into [`ScenarioError::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Failed`] when at least one run failed.
    pub fn ensure_passed(self) -> Result<Self, ScenarioError> {
        if self.passed() {
            return Ok(self);
        }
        let failed: Vec<&RunRecord> = self.runs.iter().filter(|run| run.is_failure()).collect();
        let mut summary = String::new();
        for run in &failed {
            let _ = writeln!(summary, "run {} at '{}':", run.index(), run.path());
            for assertion in run.failures() {
                let detail = assertion
                    .message()
                    .map(|message| format!(": {message}"))
                    .unwrap_or_default();
                let _ = writeln!(
                    summary,
                    "  {}({}) failed at {}{detail}",
                    assertion.macro_name(),
                    assertion.expression(),
                    assertion.location()
                );
            }
        }
        Err(ScenarioError::Failed {
            scenario: self.metadata.scenario_name().to_string(),
            failed_runs: failed.len(),
            summary: summary.trim_end().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::drain;
    use serial_test::serial;

    const AT: SectionLocation = SectionLocation::new("scenario.rs", 1);

    fn open(ctx: &ScenarioContext, name: &str, body: impl FnOnce()) {
        if let Some(_guard) = ctx.section(SectionKind::Section, name, AT) {
            body();
        }
    }

    #[test]
    #[serial(reporting)]
    fn each_leaf_gets_its_own_run() -> Result<(), ScenarioError> {
        let report = Scenario::new("leaves", file!(), line!())
            .with_reporter(LogReporter)
            .run(|ctx| {
                open(ctx, "A", || {
                    open(ctx, "B", || {});
                    open(ctx, "C", || {});
                });
            })?;
        let paths: Vec<String> = report.run_paths().iter().map(ToString::to_string).collect();
        assert_eq!(paths, ["A / B", "A / C"]);
        assert!(report.passed());
        let _ = drain();
        Ok(())
    }

    #[test]
    #[serial(reporting)]
    fn stray_panic_aborts_only_its_run() -> Result<(), ScenarioError> {
        let report = Scenario::new("stray panic", file!(), line!()).run(|ctx| {
            open(ctx, "boom", || panic!("kaboom"));
            open(ctx, "fine", || {});
        })?;
        assert_eq!(report.runs().len(), 2);
        let Some(first) = report.runs().first() else {
            panic!("two runs were recorded");
        };
        assert_eq!(
            first.status(),
            &RunStatus::Aborted {
                reason: "unexpected panic: kaboom".into()
            }
        );
        assert_eq!(report.status(), &ScenarioStatus::Failed { failed_runs: 1 });
        let Err(ScenarioError::Failed { summary, .. }) = report.ensure_passed() else {
            panic!("a failed report must not pass");
        };
        assert!(summary.contains("unexpected panic() failed at scenario.rs:1: kaboom"));
        let _ = drain();
        Ok(())
    }

    #[test]
    #[serial(reporting)]
    fn prepared_tags_drive_selection() -> Result<(), Box<dyn std::error::Error>> {
        let tags = Tags::parse("[.][nightly]")?;
        let selected = Scenario::new("prepared", file!(), line!())
            .with_tags(tags.clone())
            .with_filter(TagFilter::parse("[nightly]")?);
        assert_eq!(selected.tags(), &tags);
        assert_eq!(selected.metadata().tags(), ["nightly"]);
        let report = selected.run(|ctx| open(ctx, "only", || {}))?;
        assert_eq!(report.runs().len(), 1);

        let excluded = Scenario::new("prepared, excluded", file!(), line!())
            .with_tags(tags)
            .with_filter(TagFilter::parse("~[nightly]")?)
            .run(|ctx| open(ctx, "only", || {}))?;
        assert_eq!(excluded.status().label(), "skipped");
        let _ = drain();
        Ok(())
    }

    #[test]
    #[serial(reporting)]
    fn excluded_scenarios_are_skipped_without_running() -> Result<(), Box<dyn std::error::Error>> {
        let mut runs = 0;
        let report = Scenario::new("filtered", file!(), line!())
            .tagged("[slow]")?
            .with_filter(TagFilter::parse("~[slow]")?)
            .run(|_| runs += 1)?;
        assert_eq!(runs, 0);
        assert_eq!(report.status().label(), "skipped");
        assert!(report.passed());
        let _ = drain();
        Ok(())
    }
}
