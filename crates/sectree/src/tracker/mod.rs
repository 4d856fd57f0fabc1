//! Section tree executor.
//!
//! A scenario body is replayed from the top once per leaf path through its
//! nested sections. The [`SectionTracker`] keeps the tree discovered so far in
//! an arena and decides, at every section boundary, whether the current run
//! descends into the section or skips it.
//!
//! Each run follows the leftmost chain of sections that are not fully explored
//! yet (the frontier). Sections met for the first time are registered, and the
//! first of them is entered. As soon as one section completes, the run's cycle
//! is over and no further section is entered until the next run.
//!
//! # Examples
//!
//! ```
//! use sectree::tracker::{RunEnd, SectionTracker};
//! use sectree::{SectionKey, SectionLocation};
//!
//! let at = SectionLocation::new("tests/tree.rs", 1);
//! let mut tracker = SectionTracker::new(SectionKey::new("Scenario: demo", at));
//! let mut paths = Vec::new();
//! while !tracker.run_complete() {
//!     tracker.begin_run()?;
//!     for name in ["first", "second"] {
//!         if tracker.enter_section(SectionKey::new(name, at))? {
//!             tracker.leave_section()?;
//!         }
//!     }
//!     paths.push(tracker.end_run(RunEnd::Completed)?.to_string());
//! }
//! assert_eq!(paths, ["first", "second"]);
//! # Ok::<(), sectree::tracker::TrackerError>(())
//! ```

mod error;
mod node;

use hashbrown::{HashMap, HashSet};
use log::{debug, trace, warn};

pub use error::{TrackerAbort, TrackerError};
pub use node::{SectionKey, SectionLocation, SectionPath};

use node::{Node, SectionId};

use crate::config::DEFAULT_MAX_RUNS;

/// How a run of the scenario body ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunEnd {
    /// The body returned normally.
    Completed,
    /// The body was unwound by a failure.
    Aborted,
}

/// Run state of one scenario: the discovered section tree plus the cursor of
/// the active run.
#[derive(Debug)]
pub struct SectionTracker {
    nodes: Vec<Node>,
    lookup: HashMap<(SectionId, SectionKey), SectionId>,
    open: Vec<SectionId>,
    /// Pending child on the frontier, keyed by its parent.
    targets: HashMap<SectionId, SectionId>,
    encountered: HashSet<SectionId>,
    runs: usize,
    max_runs: usize,
    cycle_completed: bool,
    unwinding_failure: bool,
}

impl SectionTracker {
    /// Creates a tracker whose root represents the scenario itself.
    #[must_use]
    pub fn new(root: SectionKey) -> Self {
        Self {
            nodes: vec![Node::new(root, None)],
            lookup: HashMap::new(),
            open: Vec::new(),
            targets: HashMap::new(),
            encountered: HashSet::new(),
            runs: 0,
            max_runs: DEFAULT_MAX_RUNS,
            cycle_completed: false,
            unwinding_failure: false,
        }
    }

    /// Sets the run ceiling. A ceiling of zero is raised to one.
    #[must_use]
    pub fn with_max_runs(mut self, max_runs: usize) -> Self {
        self.max_runs = max_runs.max(1);
        self
    }

    /// Returns the run ceiling.
    #[must_use]
    pub const fn max_runs(&self) -> usize {
        self.max_runs
    }

    /// Returns the number of runs started so far.
    #[must_use]
    pub const fn runs(&self) -> usize {
        self.runs
    }

    /// Returns the number of sections discovered so far, excluding the root.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// Returns `true` while a run is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.open.is_empty()
    }

    /// Returns `true` once no unexplored section path remains.
    #[must_use]
    pub fn run_complete(&self) -> bool {
        self.node(SectionId::ROOT).explored
    }

    /// Starts a new run of the scenario body and returns its one-based index.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::RunInProgress`] when the previous run was not
    /// ended, [`TrackerError::Exhausted`] when every path was explored, and
    /// [`TrackerError::RunLimitExceeded`] when the run ceiling is reached.
    pub fn begin_run(&mut self) -> Result<usize, TrackerError> {
        if self.is_running() {
            return Err(TrackerError::RunInProgress {
                open: self.current_path(),
            });
        }
        if self.run_complete() {
            return Err(TrackerError::Exhausted);
        }
        if self.runs >= self.max_runs {
            warn!("run ceiling of {} reached", self.max_runs);
            return Err(TrackerError::RunLimitExceeded {
                limit: self.max_runs,
            });
        }
        self.runs += 1;
        self.targets = self.frontier_links();
        self.encountered.clear();
        self.cycle_completed = false;
        self.unwinding_failure = false;
        self.open.push(SectionId::ROOT);
        self.node_mut(SectionId::ROOT).visited_in = Some(self.runs);
        debug!(
            "run {} of '{}' targets '{}'",
            self.runs,
            self.node(SectionId::ROOT).key.name(),
            self.frontier()
        );
        Ok(self.runs)
    }

    /// Registers a section boundary and reports whether the run enters it.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NoActiveRun`] outside a run and
    /// [`TrackerError::UnstableTree`] when an unknown section appears where a
    /// pending one was expected.
    pub fn enter_section(&mut self, key: SectionKey) -> Result<bool, TrackerError> {
        let parent = *self.open.last().ok_or(TrackerError::NoActiveRun)?;
        self.unwinding_failure = false;
        let probe = (parent, key);
        let id = if let Some(existing) = self.lookup.get(&probe).copied() {
            existing
        } else {
            let (_, key) = probe;
            if let Some(expected) = self.pending_target(parent) {
                return Err(TrackerError::UnstableTree {
                    parent: self.path_of(parent),
                    expected: self.node(expected).key.clone(),
                    found: Some(key),
                });
            }
            self.register(parent, key)
        };
        self.encountered.insert(id);

        if self.node(id).explored || self.cycle_completed {
            trace!("skip {}", self.node(id).key);
            return Ok(false);
        }
        let run = self.runs;
        self.node_mut(id).visited_in = Some(run);
        self.open.push(id);
        trace!("enter {}", self.node(id).key);
        Ok(true)
    }

    /// Closes the innermost open section after its body finished.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NoActiveRun`] outside a run,
    /// [`TrackerError::UnbalancedLeave`] when no section is open and
    /// [`TrackerError::UnstableTree`] when a pending child of the section was
    /// not encountered.
    pub fn leave_section(&mut self) -> Result<(), TrackerError> {
        let id = self.innermost_section()?;
        self.unwinding_failure = false;
        if let Some(expected) = self.pending_target(id) {
            return Err(TrackerError::UnstableTree {
                parent: self.path_of(id),
                expected: self.node(expected).key.clone(),
                found: None,
            });
        }
        self.open.pop();
        if self.children_explored(id) {
            self.node_mut(id).explored = true;
            self.cycle_completed = true;
            trace!("explored {}", self.node(id).key);
        } else {
            trace!("leave {}", self.node(id).key);
        }
        Ok(())
    }

    /// Closes the innermost open section after a failure unwound its body.
    ///
    /// The first section closed this way is the one that failed: it is marked
    /// explored so it is not retried. Ancestors closed by the same unwind stay
    /// unexplored so their remaining children are discovered in later runs.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NoActiveRun`] outside a run and
    /// [`TrackerError::UnbalancedLeave`] when no section is open.
    pub fn fail_section(&mut self) -> Result<(), TrackerError> {
        let id = self.innermost_section()?;
        self.open.pop();
        if !self.unwinding_failure {
            self.unwinding_failure = true;
            self.cycle_completed = true;
            let node = self.node_mut(id);
            node.explored = true;
            node.failed = true;
            warn!("section {} failed", self.node(id).key);
        }
        Ok(())
    }

    /// Ends the active run and returns the path of sections it entered.
    ///
    /// An aborted run closes any sections still open as failed. When the
    /// failure happened outside every section the scenario itself is treated
    /// as the failing node and exploration stops.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NoActiveRun`] outside a run,
    /// [`TrackerError::UnclosedSections`] when a completed run left sections
    /// open and [`TrackerError::UnstableTree`] when a pending top-level
    /// section was not encountered.
    pub fn end_run(&mut self, end: RunEnd) -> Result<SectionPath, TrackerError> {
        if !self.is_running() {
            return Err(TrackerError::NoActiveRun);
        }
        let outcome = match end {
            RunEnd::Completed => self.close_completed_run(),
            RunEnd::Aborted => self.close_aborted_run(),
        };
        self.open.clear();
        outcome?;
        let path = self.visited_path(self.runs);
        debug!(
            "run {} of '{}' ended ({end:?}) at '{path}'",
            self.runs,
            self.node(SectionId::ROOT).key.name()
        );
        Ok(path)
    }

    /// Returns the leftmost chain of sections that still need a run.
    #[must_use]
    pub fn frontier(&self) -> SectionPath {
        let mut chain = Vec::new();
        let mut current = SectionId::ROOT;
        while let Some(next) = self.first_unexplored_child(current) {
            chain.push(next);
            current = next;
        }
        self.keys_of(&chain)
    }

    /// Returns the sections currently open, outermost first.
    #[must_use]
    pub fn current_path(&self) -> SectionPath {
        let open: Vec<_> = self.open.iter().copied().skip(1).collect();
        self.keys_of(&open)
    }

    /// Returns every discovered section without children, in tree order.
    #[must_use]
    pub fn leaf_paths(&self) -> Vec<SectionPath> {
        self.tree_order()
            .into_iter()
            .filter(|id| self.node(*id).children.is_empty())
            .map(|id| self.path_of(id))
            .collect()
    }

    /// Returns every section marked fully explored, in tree order.
    #[must_use]
    pub fn explored_paths(&self) -> Vec<SectionPath> {
        self.tree_order()
            .into_iter()
            .filter(|id| self.node(*id).explored)
            .map(|id| self.path_of(id))
            .collect()
    }

    /// Returns the paths of sections that were closed by a failure.
    #[must_use]
    pub fn failed_paths(&self) -> Vec<SectionPath> {
        self.nodes
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, node)| node.failed)
            .map(|(index, _)| self.path_of(SectionId::from_index(index)))
            .collect()
    }

    /// Depth-first pre-order over the discovered sections.
    fn tree_order(&self) -> Vec<SectionId> {
        let mut order = Vec::with_capacity(self.section_count());
        let mut stack: Vec<SectionId> = self
            .node(SectionId::ROOT)
            .children
            .iter()
            .rev()
            .copied()
            .collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        order
    }

    /// Returns the sections marked visited by run `run`.
    fn visited_path(&self, run: usize) -> SectionPath {
        // Parents are registered before their children, so arena order is
        // root-first along the single chain a run enters.
        self.nodes
            .iter()
            .skip(1)
            .filter(|node| node.visited_in == Some(run))
            .map(|node| node.key.clone())
            .collect::<Vec<_>>()
            .into()
    }

    fn close_completed_run(&mut self) -> Result<(), TrackerError> {
        if self.open.len() > 1 {
            return Err(TrackerError::UnclosedSections {
                open: self.current_path(),
            });
        }
        if let Some(expected) = self.pending_target(SectionId::ROOT) {
            return Err(TrackerError::UnstableTree {
                parent: SectionPath::default(),
                expected: self.node(expected).key.clone(),
                found: None,
            });
        }
        if self.children_explored(SectionId::ROOT) {
            self.node_mut(SectionId::ROOT).explored = true;
        }
        Ok(())
    }

    fn close_aborted_run(&mut self) -> Result<(), TrackerError> {
        while self.open.len() > 1 {
            self.fail_section()?;
        }
        if !self.unwinding_failure {
            let root = self.node_mut(SectionId::ROOT);
            root.explored = true;
            root.failed = true;
            warn!(
                "scenario '{}' failed outside any section",
                self.node(SectionId::ROOT).key.name()
            );
        }
        Ok(())
    }

    fn innermost_section(&self) -> Result<SectionId, TrackerError> {
        match self.open.last().copied() {
            None => Err(TrackerError::NoActiveRun),
            Some(SectionId::ROOT) => Err(TrackerError::UnbalancedLeave),
            Some(id) => Ok(id),
        }
    }

    fn register(&mut self, parent: SectionId, key: SectionKey) -> SectionId {
        let id = SectionId::from_index(self.nodes.len());
        self.nodes.push(Node::new(key.clone(), Some(parent)));
        self.node_mut(parent).children.push(id);
        self.lookup.insert((parent, key), id);
        trace!("registered {}", self.node(id).key);
        id
    }

    fn pending_target(&self, parent: SectionId) -> Option<SectionId> {
        self.targets
            .get(&parent)
            .copied()
            .filter(|target| !self.encountered.contains(target))
    }

    fn frontier_links(&self) -> HashMap<SectionId, SectionId> {
        let mut links = HashMap::new();
        let mut current = SectionId::ROOT;
        while let Some(next) = self.first_unexplored_child(current) {
            links.insert(current, next);
            current = next;
        }
        links
    }

    fn first_unexplored_child(&self, id: SectionId) -> Option<SectionId> {
        self.node(id)
            .children
            .iter()
            .copied()
            .find(|child| !self.node(*child).explored)
    }

    fn children_explored(&self, id: SectionId) -> bool {
        self.node(id)
            .children
            .iter()
            .all(|child| self.node(*child).explored)
    }

    fn path_of(&self, id: SectionId) -> SectionPath {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == SectionId::ROOT {
                break;
            }
            chain.push(node_id);
            current = self.node(node_id).parent;
        }
        chain.reverse();
        self.keys_of(&chain)
    }

    fn keys_of(&self, ids: &[SectionId]) -> SectionPath {
        ids.iter()
            .map(|id| self.node(*id).key.clone())
            .collect::<Vec<_>>()
            .into()
    }

    fn node(&self, id: SectionId) -> &Node {
        self.nodes
            .get(id.index())
            .unwrap_or_else(|| unreachable!("section ids are only issued by this tracker"))
    }

    fn node_mut(&mut self, id: SectionId) -> &mut Node {
        self.nodes
            .get_mut(id.index())
            .unwrap_or_else(|| unreachable!("section ids are only issued by this tracker"))
    }
}
