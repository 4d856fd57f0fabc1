//! Scenario registration and listing.
//!
//! Every scenario declared with [`scenario!`](crate::scenario!) submits a
//! [`ScenarioDescriptor`] to a link-time registry, so a test binary can list
//! its scenarios or select them by tag without running them.

use inventory::iter;
use log::warn;

use crate::tags::{self, TagFilter, Tags};

/// A scenario declared somewhere in the test binary.
#[derive(Debug)]
pub struct ScenarioDescriptor {
    /// Scenario name.
    pub name: &'static str,
    /// Tag string exactly as declared, for example `"[vector][bdd]"`.
    pub tags: &'static str,
    /// Source file of the declaration.
    pub file: &'static str,
    /// Line of the declaration.
    pub line: u32,
}

impl ScenarioDescriptor {
    /// Creates a descriptor; `const` so it can be used in `submit!`.
    #[must_use]
    pub const fn new(
        name: &'static str,
        tags: &'static str,
        file: &'static str,
        line: u32,
    ) -> Self {
        Self {
            name,
            tags,
            file,
            line,
        }
    }

    /// Parses the declared tags, logging and ignoring malformed strings.
    #[must_use]
    pub fn parsed_tags(&self) -> Tags {
        Tags::parse(self.tags).unwrap_or_else(|error| {
            warn!(
                "ignoring tags of scenario '{}' at {}:{}: {error}",
                self.name, self.file, self.line
            );
            Tags::default()
        })
    }
}

/// Register a scenario with the global registry.
///
/// [`scenario!`](crate::scenario!) calls this for every declaration.
///
/// # Examples
///
/// ```
/// sectree::register_scenario!("listed scenario", "[docs]", file!(), line!());
///
/// assert!(sectree::registry::scenarios()
///     .iter()
///     .any(|scenario| scenario.name == "listed scenario"));
/// ```
#[macro_export]
macro_rules! register_scenario {
    ($name:expr, $tags:expr, $file:expr, $line:expr $(,)?) => {
        $crate::submit! {
            $crate::registry::ScenarioDescriptor::new($name, $tags, $file, $line)
        }
    };
}

inventory::collect!(ScenarioDescriptor);

/// Lists every registered scenario ordered by file and line.
#[must_use]
pub fn scenarios() -> Vec<&'static ScenarioDescriptor> {
    let mut all: Vec<_> = iter::<ScenarioDescriptor>.into_iter().collect();
    all.sort_by(|a, b| (a.file, a.line, a.name).cmp(&(b.file, b.line, b.name)));
    all
}

/// Lists the registered scenarios that run under `filter`.
///
/// Hidden scenarios appear only when the filter requires one of their tags.
#[must_use]
pub fn scenarios_matching(filter: &TagFilter) -> Vec<&'static ScenarioDescriptor> {
    scenarios()
        .into_iter()
        .filter(|scenario| tags::selected(&scenario.parsed_tags(), Some(filter)))
        .collect()
}
