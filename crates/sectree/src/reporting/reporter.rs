//! Live progress notifications.

use log::{debug, info, trace, warn};

use super::{AssertionRecord, RunRecord, ScenarioRecord};
use crate::harness::ScenarioMetadata;
use crate::tracker::SectionPath;

/// How a section body was left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionEnd {
    /// The body ran to its end.
    Completed,
    /// A failure unwound the body.
    Failed,
}

/// Observer notified while a scenario executes.
///
/// Every method has an empty default so implementations override only the
/// events they care about. Section paths include the section being entered or
/// left as their last element.
pub trait Reporter {
    /// A scenario is about to start its first run.
    fn scenario_started(&mut self, _metadata: &ScenarioMetadata) {}

    /// Run number `run` (one-based) is starting.
    fn run_started(&mut self, _run: usize) {}

    /// The run entered a section.
    fn section_started(&mut self, _path: &SectionPath) {}

    /// The run left a section.
    fn section_ended(&mut self, _path: &SectionPath, _end: SectionEnd) {}

    /// An assertion was evaluated.
    fn assertion(&mut self, _record: &AssertionRecord) {}

    /// A run finished.
    fn run_ended(&mut self, _record: &RunRecord) {}

    /// The scenario finished, was skipped or errored.
    fn scenario_ended(&mut self, _record: &ScenarioRecord) {}
}

/// Reporter that forwards events to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn scenario_started(&mut self, metadata: &ScenarioMetadata) {
        info!(
            "scenario '{}' ({}:{})",
            metadata.scenario_name(),
            metadata.source_file(),
            metadata.line()
        );
    }

    fn run_started(&mut self, run: usize) {
        debug!("run {run} started");
    }

    fn section_started(&mut self, path: &SectionPath) {
        trace!("-> {path}");
    }

    fn section_ended(&mut self, path: &SectionPath, end: SectionEnd) {
        match end {
            SectionEnd::Completed => trace!("<- {path}"),
            SectionEnd::Failed => debug!("<- {path} (failed)"),
        }
    }

    fn assertion(&mut self, record: &AssertionRecord) {
        if record.passed() {
            trace!("{}({}) passed", record.macro_name(), record.expression());
            return;
        }
        let detail = record
            .message()
            .map(|m| format!(": {m}"))
            .unwrap_or_default();
        warn!(
            "{}({}) failed at {} in '{}'{detail}",
            record.macro_name(),
            record.expression(),
            record.location(),
            record.section(),
        );
    }

    fn run_ended(&mut self, record: &RunRecord) {
        debug!(
            "run {} {} at '{}'",
            record.index(),
            record.status().label(),
            record.path()
        );
    }

    fn scenario_ended(&mut self, record: &ScenarioRecord) {
        info!(
            "scenario '{}' {} after {} run(s)",
            record.scenario_name(),
            record.status().label(),
            record.runs()
        );
    }
}
