//! Errors raised by the section tracker.

use std::panic;

use thiserror::Error;

use super::{SectionKey, SectionPath};

/// Bookkeeping failure inside the section tracker.
///
/// Every variant is fatal to the scenario being explored: the driver stops
/// re-running the body and surfaces the error.
///
/// # Examples
///
/// ```
/// use sectree::tracker::TrackerError;
///
/// let error = TrackerError::RunLimitExceeded { limit: 3 };
/// assert_eq!(
///     error.to_string(),
///     "scenario exceeded the limit of 3 runs; section names may be unstable between runs",
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TrackerError {
    /// A section operation was attempted outside a run.
    #[error("no run is active; call begin_run first")]
    NoActiveRun,
    /// A run was started while the previous one still had open sections.
    #[error("a run is already active with open sections: {open}")]
    RunInProgress {
        /// Sections still open from the previous run.
        open: SectionPath,
    },
    /// A run was requested although every path was already explored.
    #[error("every section path has already been explored")]
    Exhausted,
    /// `leave_section` was called without a matching `enter_section`.
    #[error("left a section that was never entered")]
    UnbalancedLeave,
    /// A run finished normally while sections were still open.
    #[error("run finished with open sections: {open}")]
    UnclosedSections {
        /// Sections left open at the end of the run.
        open: SectionPath,
    },
    /// A section seen in an earlier run vanished or was replaced.
    #[error(
        "section tree changed between runs under '{parent}': expected {expected}{}",
        found.as_ref().map(|key| format!(", found {key}")).unwrap_or_default()
    )]
    UnstableTree {
        /// Path of the section whose children changed; empty for the root.
        parent: SectionPath,
        /// The pending section that should have been encountered.
        expected: SectionKey,
        /// The unknown section met in its place, if any.
        found: Option<SectionKey>,
    },
    /// The scenario ran more often than the configured ceiling allows.
    #[error(
        "scenario exceeded the limit of {limit} runs; section names may be unstable between runs"
    )]
    RunLimitExceeded {
        /// The ceiling that was hit.
        limit: usize,
    },
}

impl TrackerError {
    /// Abort the current run by unwinding with this error as payload.
    ///
    /// The scenario driver recognises the [`TrackerAbort`] payload and stops
    /// exploring instead of treating it as an assertion failure.
    pub fn raise(self) -> ! {
        panic::resume_unwind(Box::new(TrackerAbort(self)));
    }
}

/// Unwind payload carrying a fatal [`TrackerError`] out of a scenario body.
#[derive(Debug)]
pub struct TrackerAbort(pub TrackerError);

impl TrackerAbort {
    /// Consume the payload, returning the wrapped error.
    #[must_use]
    pub fn into_error(self) -> TrackerError {
        self.0
    }
}
