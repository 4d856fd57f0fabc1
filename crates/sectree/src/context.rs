//! The handle a scenario body uses during one run.

use std::cell::RefCell;
use std::mem;
use std::thread;

use log::{error, warn};

use crate::assertion::RequireFailure;
use crate::reporting::{AssertionRecord, Reporter, SectionEnd};
use crate::section::SectionKind;
use crate::tracker::{
    RunEnd, SectionKey, SectionLocation, SectionPath, SectionTracker, TrackerError,
};

/// Per-scenario state shared by every run of the body.
///
/// The body receives `&ScenarioContext` and opens sections through
/// [`section`](Self::section), usually via the section macros. The context is
/// neither `Send` nor `Sync`: sections must be opened on the thread running
/// the body.
///
/// # Examples
///
/// ```
/// use sectree::{Scenario, SectionKind, SectionLocation};
///
/// let at = SectionLocation::new(file!(), line!());
/// let mut entered = Vec::new();
/// let report = Scenario::new("context demo", file!(), line!()).run(|ctx| {
///     for name in ["one", "two"] {
///         if let Some(_guard) = ctx.section(SectionKind::Section, name, at) {
///             entered.push(ctx.current_path().to_string());
///         }
///     }
/// })?;
/// assert_eq!(entered, ["one", "two"]);
/// assert_eq!(report.runs().len(), 2);
/// # Ok::<(), sectree::ScenarioError>(())
/// ```
pub struct ScenarioContext {
    tracker: RefCell<SectionTracker>,
    assertions: RefCell<Vec<AssertionRecord>>,
    reporter: RefCell<Box<dyn Reporter>>,
    fatal: RefCell<Option<TrackerError>>,
}

impl ScenarioContext {
    pub(crate) fn new(tracker: SectionTracker, reporter: Box<dyn Reporter>) -> Self {
        Self {
            tracker: RefCell::new(tracker),
            assertions: RefCell::new(Vec::new()),
            reporter: RefCell::new(reporter),
            fatal: RefCell::new(None),
        }
    }

    /// Registers a section and returns a guard when this run enters it.
    ///
    /// The section body must run while the guard is alive; dropping the guard
    /// leaves the section. Returns `None` when the section is skipped in this
    /// run.
    ///
    /// A fatal tracker error, such as a section tree that changed between
    /// runs, unwinds the body and stops the scenario.
    #[must_use = "the section is left as soon as the guard is dropped"]
    pub fn section(
        &self,
        kind: SectionKind,
        name: &str,
        location: SectionLocation,
    ) -> Option<SectionGuard<'_>> {
        self.rethrow_fatal();
        let key = SectionKey::new(kind.label(name), location);
        let entered = self.tracker.borrow_mut().enter_section(key);
        match entered {
            Ok(true) => {
                let path = self.current_path();
                self.reporter.borrow_mut().section_started(&path);
                Some(SectionGuard { context: self })
            }
            Ok(false) => None,
            Err(error) => self.abort(error),
        }
    }

    /// Records an evaluated assertion and returns whether it passed.
    ///
    /// A failed [`Severity::Require`](crate::reporting::Severity::Require)
    /// assertion unwinds the body, ending the run.
    pub fn record(&self, record: AssertionRecord) -> bool {
        let record = record.with_section(self.current_path());
        let passed = record.passed();
        let aborts = !passed && record.severity().aborts_run();
        self.push_record(record.clone());
        if aborts {
            RequireFailure::raise(record);
        }
        passed
    }

    /// Returns the sections open at this point of the run.
    #[must_use]
    pub fn current_path(&self) -> SectionPath {
        self.tracker.borrow().current_path()
    }

    /// Returns the one-based index of the active run.
    #[must_use]
    pub fn run_index(&self) -> usize {
        self.tracker.borrow().runs()
    }

    /// Returns the number of assertions recorded in the active run.
    #[must_use]
    pub fn assertion_count(&self) -> usize {
        self.assertions.borrow().len()
    }

    pub(crate) fn push_record(&self, record: AssertionRecord) {
        self.reporter.borrow_mut().assertion(&record);
        self.assertions.borrow_mut().push(record);
    }

    pub(crate) fn begin_run(&self) -> Result<usize, TrackerError> {
        let run = self.tracker.borrow_mut().begin_run()?;
        self.assertions.borrow_mut().clear();
        self.reporter.borrow_mut().run_started(run);
        Ok(run)
    }

    pub(crate) fn end_run(&self, end: RunEnd) -> Result<SectionPath, TrackerError> {
        self.tracker.borrow_mut().end_run(end)
    }

    pub(crate) fn run_complete(&self) -> bool {
        self.tracker.borrow().run_complete()
    }

    pub(crate) fn take_assertions(&self) -> Vec<AssertionRecord> {
        mem::take(&mut *self.assertions.borrow_mut())
    }

    /// Fatal error raised during the run, even if user code caught the unwind.
    pub(crate) fn take_fatal(&self) -> Option<TrackerError> {
        self.fatal.borrow_mut().take()
    }

    pub(crate) fn with_reporter<R>(&self, f: impl FnOnce(&mut dyn Reporter) -> R) -> R {
        f(self.reporter.borrow_mut().as_mut())
    }

    pub(crate) fn into_tracker(self) -> SectionTracker {
        self.tracker.into_inner()
    }

    fn rethrow_fatal(&self) {
        let stored = self.fatal.borrow().clone();
        if let Some(error) = stored {
            error.raise();
        }
    }

    fn abort(&self, error: TrackerError) -> ! {
        error!("{error}");
        self.keep_fatal(error.clone());
        error.raise()
    }

    fn keep_fatal(&self, error: TrackerError) {
        let mut fatal = self.fatal.borrow_mut();
        if fatal.is_none() {
            *fatal = Some(error);
        }
    }

    fn leave_innermost(&self) {
        let path = self.current_path();
        let left = self.tracker.borrow_mut().leave_section();
        match left {
            Ok(()) => self
                .reporter
                .borrow_mut()
                .section_ended(&path, SectionEnd::Completed),
            Err(error) => self.abort(error),
        }
    }

    fn fail_innermost(&self) {
        let path = self.current_path();
        let failed = self.tracker.borrow_mut().fail_section();
        match failed {
            Ok(()) => self
                .reporter
                .borrow_mut()
                .section_ended(&path, SectionEnd::Failed),
            Err(error) => {
                // Already unwinding: keep the error for the driver instead of
                // panicking a second time.
                warn!("while unwinding '{path}': {error}");
                self.keep_fatal(error);
            }
        }
    }
}

/// Keeps a section open; dropping it leaves the section.
///
/// When the guard is dropped during a panic the section is closed as failed.
#[must_use = "the section is left as soon as the guard is dropped"]
pub struct SectionGuard<'a> {
    context: &'a ScenarioContext,
}

impl SectionGuard<'_> {
    /// Returns the context the section belongs to.
    #[must_use]
    pub const fn context(&self) -> &ScenarioContext {
        self.context
    }
}

impl Drop for SectionGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.context.fail_innermost();
        } else {
            self.context.leave_innermost();
        }
    }
}
