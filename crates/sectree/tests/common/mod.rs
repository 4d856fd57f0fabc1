//! Shared helpers for behavioural tests.

use std::cell::RefCell;
use std::rc::Rc;

use sectree::reporting::{AssertionRecord, Reporter, RunRecord, ScenarioRecord, SectionEnd};
use sectree::{ScenarioMetadata, SectionPath};

/// Reporter that keeps a readable trace of every event.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    /// Returns the events seen so far.
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    /// Returns the paths of entered sections, one entry per `section_started`.
    pub fn entered(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| event.strip_prefix("enter ").map(String::from))
            .collect()
    }

    fn push(&self, event: String) {
        self.events.borrow_mut().push(event);
    }
}

impl Reporter for Recorder {
    fn scenario_started(&mut self, metadata: &ScenarioMetadata) {
        self.push(format!("scenario {}", metadata.scenario_name()));
    }

    fn run_started(&mut self, run: usize) {
        self.push(format!("run {run}"));
    }

    fn section_started(&mut self, path: &SectionPath) {
        self.push(format!("enter {path}"));
    }

    fn section_ended(&mut self, path: &SectionPath, end: SectionEnd) {
        let verb = match end {
            SectionEnd::Completed => "leave",
            SectionEnd::Failed => "fail",
        };
        self.push(format!("{verb} {path}"));
    }

    fn assertion(&mut self, record: &AssertionRecord) {
        let outcome = if record.passed() { "ok" } else { "failed" };
        self.push(format!("{} {outcome}", record.macro_name()));
    }

    fn run_ended(&mut self, record: &RunRecord) {
        self.push(format!(
            "end {} {}",
            record.index(),
            record.status().label()
        ));
    }

    fn scenario_ended(&mut self, record: &ScenarioRecord) {
        self.push(format!("done {}", record.status().label()));
    }
}
