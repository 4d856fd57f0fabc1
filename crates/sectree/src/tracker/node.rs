//! Section identities and the arena nodes that hold them.

use std::fmt;

use derive_more::{Deref, From};

/// Source location of a section declaration.
///
/// Two sections sharing a name under the same parent are distinguished by
/// their location.
///
/// # Examples
///
/// ```
/// use sectree::SectionLocation;
///
/// let location = SectionLocation::new("tests/vector.rs", 42);
/// assert_eq!(location.to_string(), "tests/vector.rs:42");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SectionLocation {
    file: &'static str,
    line: u32,
}

impl SectionLocation {
    /// Creates a location from a `file!()`/`line!()` pair.
    #[must_use]
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    /// Returns the source file.
    #[must_use]
    pub const fn file(self) -> &'static str {
        self.file
    }

    /// Returns the one-based line.
    #[must_use]
    pub const fn line(self) -> u32 {
        self.line
    }
}

impl fmt::Display for SectionLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Stable identity of a section: its display name plus its location.
///
/// # Examples
///
/// ```
/// use sectree::{SectionKey, SectionLocation};
///
/// let key = SectionKey::new("Given: an empty vector", SectionLocation::new("tests/vector.rs", 7));
/// assert_eq!(key.name(), "Given: an empty vector");
/// assert_eq!(key.location().line(), 7);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SectionKey {
    name: String,
    location: SectionLocation,
}

impl SectionKey {
    /// Creates a key from a section name and its location.
    #[must_use]
    pub fn new(name: impl Into<String>, location: SectionLocation) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }

    /// Returns the section name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the section location.
    #[must_use]
    pub const fn location(&self) -> SectionLocation {
        self.location
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({})", self.name, self.location)
    }
}

/// Ordered section keys from the outermost section down to a nested one.
///
/// The scenario itself is the implicit root and never appears in a path.
///
/// # Examples
///
/// ```
/// use sectree::{SectionKey, SectionLocation, SectionPath};
///
/// let at = SectionLocation::new("tests/tree.rs", 1);
/// let path = SectionPath::from(vec![SectionKey::new("A", at), SectionKey::new("B", at)]);
/// assert_eq!(path.names(), ["A", "B"]);
/// assert_eq!(path.to_string(), "A / B");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deref, From)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SectionPath(Vec<SectionKey>);

impl SectionPath {
    /// Returns the section names along the path.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(SectionKey::name).collect()
    }

    /// Returns the innermost section of the path.
    #[must_use]
    pub fn leaf(&self) -> Option<&SectionKey> {
        self.0.last()
    }
}

impl fmt::Display for SectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for key in &self.0 {
            if !first {
                f.write_str(" / ")?;
            }
            f.write_str(key.name())?;
            first = false;
        }
        Ok(())
    }
}

/// Arena index of a section node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct SectionId(usize);

impl SectionId {
    pub(crate) const ROOT: Self = Self(0);

    pub(crate) const fn index(self) -> usize {
        self.0
    }

    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index)
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) key: SectionKey,
    pub(crate) parent: Option<SectionId>,
    pub(crate) children: Vec<SectionId>,
    /// Run index in which the node was last entered.
    pub(crate) visited_in: Option<usize>,
    pub(crate) explored: bool,
    pub(crate) failed: bool,
}

impl Node {
    pub(crate) fn new(key: SectionKey, parent: Option<SectionId>) -> Self {
        Self {
            key,
            parent,
            children: Vec::new(),
            visited_in: None,
            explored: false,
            failed: false,
        }
    }
}
