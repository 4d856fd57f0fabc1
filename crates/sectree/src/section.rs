//! Section kinds and their display prefixes.

/// The flavour of a section, which decides the prefix of its display name.
///
/// The prefix becomes part of the section identity, so `given!("x")` and
/// `when!("x")` under the same parent are distinct sections even on one line.
///
/// # Examples
///
/// ```
/// use sectree::SectionKind;
///
/// assert_eq!(SectionKind::Given.label("an empty vector"), "Given: an empty vector");
/// assert_eq!(SectionKind::AndThen.label("the size is 0"), "And: the size is 0");
/// assert_eq!(SectionKind::Section.label("plain"), "plain");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SectionKind {
    /// A plain section without prefix.
    Section,
    /// A scenario root.
    Scenario,
    /// Establishes preconditions.
    Given,
    /// Adds to the preconditions of an enclosing `Given`.
    AndGiven,
    /// Performs the action under test.
    When,
    /// Follows up on an enclosing `When`.
    AndWhen,
    /// States an expected outcome.
    Then,
    /// States a further outcome after an enclosing `Then`.
    AndThen,
}

impl SectionKind {
    /// Returns the prefix put in front of section names of this kind.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Section => "",
            Self::Scenario => "Scenario: ",
            Self::Given => "Given: ",
            Self::AndGiven => "And given: ",
            Self::When => "When: ",
            Self::AndWhen => "And when: ",
            Self::Then => "Then: ",
            Self::AndThen => "And: ",
        }
    }

    /// Builds the display name of a section of this kind.
    #[must_use]
    pub fn label(self, name: &str) -> String {
        format!("{}{name}", self.prefix())
    }
}
