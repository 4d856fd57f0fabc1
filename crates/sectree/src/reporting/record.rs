//! Data structures describing assertions, runs and scenarios.

use crate::tracker::{SectionLocation, SectionPath};

/// How a failed assertion affects the run and the scenario.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Severity {
    /// A failure aborts the current run and fails the scenario.
    Require,
    /// A failure fails the scenario; the run continues.
    Check,
    /// A failure is recorded but never fails the scenario.
    NoFail,
}

impl Severity {
    /// Returns `true` when a failure stops the current run.
    #[must_use]
    pub const fn aborts_run(self) -> bool {
        matches!(self, Self::Require)
    }

    /// Returns `true` when a failure fails the scenario.
    #[must_use]
    pub const fn fails_scenario(self) -> bool {
        !matches!(self, Self::NoFail)
    }
}

/// One checked condition and its outcome.
///
/// # Examples
///
/// ```
/// use sectree::reporting::{AssertionRecord, Severity};
/// use sectree::SectionLocation;
///
/// let record = AssertionRecord::new(
///     "check",
///     Severity::Check,
///     "v.len() == 10",
///     false,
///     SectionLocation::new("tests/vector.rs", 14),
/// );
/// assert!(record.is_failure());
/// assert_eq!(record.expression(), "v.len() == 10");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AssertionRecord {
    macro_name: &'static str,
    severity: Severity,
    expression: String,
    passed: bool,
    location: SectionLocation,
    message: Option<String>,
    section: SectionPath,
}

impl AssertionRecord {
    /// Creates a record for an assertion evaluated at `location`.
    #[must_use]
    pub fn new(
        macro_name: &'static str,
        severity: Severity,
        expression: impl Into<String>,
        passed: bool,
        location: SectionLocation,
    ) -> Self {
        Self {
            macro_name,
            severity,
            expression: expression.into(),
            passed,
            location,
            message: None,
            section: SectionPath::default(),
        }
    }

    /// Attaches a detail message, such as a panic payload.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches the path of sections open when the assertion ran.
    #[must_use]
    pub fn with_section(mut self, section: SectionPath) -> Self {
        self.section = section;
        self
    }

    /// Returns the name of the macro that produced the record.
    #[must_use]
    pub const fn macro_name(&self) -> &'static str {
        self.macro_name
    }

    /// Returns the assertion severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the asserted expression as written.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Returns `true` when the condition held.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.passed
    }

    /// Returns the assertion location.
    #[must_use]
    pub const fn location(&self) -> SectionLocation {
        self.location
    }

    /// Returns the detail message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the sections open when the assertion ran.
    #[must_use]
    pub fn section(&self) -> &SectionPath {
        &self.section
    }

    /// Returns `true` when the record fails its scenario.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !self.passed && self.severity.fails_scenario()
    }
}

/// Outcome of one run of a scenario body.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RunStatus {
    /// The body returned and every failing assertion was non-fatal.
    Passed,
    /// The body returned but at least one check failed.
    Failed,
    /// The body was unwound by a failed requirement or an unexpected panic.
    Aborted {
        /// Description of what stopped the run.
        reason: String,
    },
}

impl RunStatus {
    /// Retrieve the lowercase label for the status.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Aborted { .. } => "aborted",
        }
    }
}

/// Everything one run of a scenario body did.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RunRecord {
    index: usize,
    path: SectionPath,
    assertions: Vec<AssertionRecord>,
    status: RunStatus,
}

impl RunRecord {
    /// Creates a record for the run with one-based `index`.
    #[must_use]
    pub fn new(
        index: usize,
        path: SectionPath,
        assertions: Vec<AssertionRecord>,
        status: RunStatus,
    ) -> Self {
        Self {
            index,
            path,
            assertions,
            status,
        }
    }

    /// Returns the one-based run index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns the sections the run entered.
    #[must_use]
    pub fn path(&self) -> &SectionPath {
        &self.path
    }

    /// Returns the assertions evaluated during the run.
    #[must_use]
    pub fn assertions(&self) -> &[AssertionRecord] {
        &self.assertions
    }

    /// Returns the run status.
    #[must_use]
    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    /// Iterates over assertions that fail the scenario.
    pub fn failures(&self) -> impl Iterator<Item = &AssertionRecord> {
        self.assertions.iter().filter(|record| record.is_failure())
    }

    /// Returns `true` when the run fails its scenario.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !matches!(self.status, RunStatus::Passed)
    }
}

/// Status of a scenario recorded by the collector.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ScenarioStatus {
    /// Every run passed.
    Passed,
    /// At least one run failed.
    Failed {
        /// Number of failed or aborted runs.
        failed_runs: usize,
    },
    /// The scenario did not run because the tag filter excluded it.
    Skipped {
        /// Why the scenario was skipped.
        reason: String,
    },
    /// Exploration stopped on a fatal section tracker error.
    Errored {
        /// The rendered tracker error.
        message: String,
    },
}

impl ScenarioStatus {
    /// Retrieve the lowercase label for the status.
    ///
    /// # Examples
    /// ```
    /// use sectree::reporting::ScenarioStatus;
    ///
    /// assert_eq!(ScenarioStatus::Passed.label(), "passed");
    /// assert_eq!(ScenarioStatus::Failed { failed_runs: 1 }.label(), "failed");
    /// ```
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed { .. } => "failed",
            Self::Skipped { .. } => "skipped",
            Self::Errored { .. } => "errored",
        }
    }

    /// Returns `true` for statuses that should fail the surrounding test.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Errored { .. })
    }
}

/// Outcome recorded for a single scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScenarioRecord {
    scenario_name: String,
    source_file: String,
    line: u32,
    tags: Vec<String>,
    runs: usize,
    status: ScenarioStatus,
}

impl ScenarioRecord {
    /// Construct a new record for the provided scenario metadata.
    ///
    /// # Examples
    /// ```
    /// use sectree::reporting::{ScenarioRecord, ScenarioStatus};
    ///
    /// let record = ScenarioRecord::new(
    ///     "Vector resizing affects size and capacity",
    ///     "tests/vector.rs",
    ///     3,
    ///     vec!["vector".into()],
    ///     4,
    ///     ScenarioStatus::Passed,
    /// );
    /// assert_eq!(record.runs(), 4);
    /// assert_eq!(record.tags(), ["vector"]);
    /// ```
    #[must_use]
    pub fn new(
        scenario_name: impl Into<String>,
        source_file: impl Into<String>,
        line: u32,
        tags: Vec<String>,
        runs: usize,
        status: ScenarioStatus,
    ) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            source_file: source_file.into(),
            line,
            tags,
            runs,
            status,
        }
    }

    /// Access the recorded scenario name.
    #[must_use]
    pub fn scenario_name(&self) -> &str {
        &self.scenario_name
    }

    /// Access the source file declaring the scenario.
    #[must_use]
    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    /// Access the declaration line.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Access the scenario tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Access the number of runs performed.
    #[must_use]
    pub const fn runs(&self) -> usize {
        self.runs
    }

    /// Access the stored status value.
    #[must_use]
    pub fn status(&self) -> &ScenarioStatus {
        &self.status
    }
}
