//! Scenario tags and tag filters.
//!
//! Tags are written as bracketed names, for example `"[vector][bdd]"`.
//! Whitespace between brackets is ignored and names compare
//! case-insensitively. A name starting with `.` hides the scenario: `[.]`
//! only hides it, `[.slow]` hides it and adds the `slow` tag. Hidden
//! scenarios run only when a filter explicitly requires one of their tags.
//!
//! Filters reuse the bracket syntax: `[a][b]` requires both tags and `~[c]`
//! excludes scenarios tagged `c`.

use std::fmt;

use thiserror::Error;

/// Errors raised while parsing tag strings and filters.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TagError {
    /// A `[` without its closing `]`.
    #[error("unterminated tag starting at byte {position}")]
    Unterminated {
        /// Byte offset of the opening bracket.
        position: usize,
    },
    /// A `[]` pair with no name inside.
    #[error("empty tag at byte {position}")]
    Empty {
        /// Byte offset of the opening bracket.
        position: usize,
    },
    /// Text outside of brackets.
    #[error("unexpected {found:?} at byte {position}; tags must be written as [name]")]
    Stray {
        /// Byte offset of the offending character.
        position: usize,
        /// The offending character.
        found: char,
    },
}

/// A single tag name, compared case-insensitively.
#[derive(Clone, Debug, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Tag(String);

impl Tag {
    /// Creates a tag from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the tag name as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

/// The tags attached to one scenario.
///
/// # Examples
///
/// ```
/// use sectree::tags::{Tag, Tags};
///
/// let tags = Tags::parse("[vector][bdd] [Size]")?;
/// assert!(tags.contains(&Tag::new("size")));
/// assert_eq!(tags.to_string(), "[vector][bdd][Size]");
/// assert!(!tags.is_hidden());
/// # Ok::<(), sectree::tags::TagError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Tags {
    tags: Vec<Tag>,
    hidden: bool,
}

impl Tags {
    /// Parses a bracketed tag string.
    ///
    /// # Errors
    ///
    /// Returns a [`TagError`] for unterminated or empty tags and for text
    /// outside brackets.
    pub fn parse(input: &str) -> Result<Self, TagError> {
        let mut parsed = Self::default();
        for (_, name) in bracketed(input)? {
            if let Some(rest) = name.strip_prefix('.') {
                parsed.hidden = true;
                if !rest.is_empty() {
                    parsed.push(Tag::new(rest));
                }
            } else {
                parsed.push(Tag::new(name));
            }
        }
        Ok(parsed)
    }

    /// Returns `true` when the scenario carries `tag`.
    #[must_use]
    pub fn contains(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    /// Returns `true` when the scenario is hidden from unfiltered runs.
    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Iterates over the tags in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    /// Returns the tag names as owned strings.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.tags
            .iter()
            .map(|tag| tag.as_str().to_string())
            .collect()
    }

    fn push(&mut self, tag: Tag) {
        if !self.contains(&tag) {
            self.tags.push(tag);
        }
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hidden {
            f.write_str("[.]")?;
        }
        for tag in &self.tags {
            write!(f, "{tag}")?;
        }
        Ok(())
    }
}

/// Selects scenarios by required and excluded tags.
///
/// # Examples
///
/// ```
/// use sectree::tags::{TagFilter, Tags};
///
/// let filter = TagFilter::parse("[bdd] ~[slow]")?;
/// assert!(filter.matches(&Tags::parse("[bdd][vector]")?));
/// assert!(!filter.matches(&Tags::parse("[bdd][slow]")?));
/// assert!(!filter.matches(&Tags::parse("[vector]")?));
/// # Ok::<(), sectree::tags::TagError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagFilter {
    required: Vec<Tag>,
    excluded: Vec<Tag>,
}

impl TagFilter {
    /// Parses a filter expression.
    ///
    /// # Errors
    ///
    /// Returns a [`TagError`] when the expression is malformed.
    pub fn parse(input: &str) -> Result<Self, TagError> {
        let mut filter = Self::default();
        let mut negate_at = None;
        let mut rest = input;
        let mut offset = 0;
        while let Some(ch) = rest.chars().next() {
            match ch {
                '~' => {
                    negate_at = Some(offset);
                    offset += 1;
                    rest = rest.get(1..).unwrap_or_default();
                }
                '[' => {
                    let close = rest
                        .find(']')
                        .ok_or(TagError::Unterminated { position: offset })?;
                    let name = rest.get(1..close).unwrap_or_default().trim();
                    if name.is_empty() {
                        return Err(TagError::Empty { position: offset });
                    }
                    let tag = Tag::new(name.trim_start_matches('.'));
                    if negate_at.take().is_some() {
                        filter.excluded.push(tag);
                    } else {
                        filter.required.push(tag);
                    }
                    offset += close + 1;
                    rest = rest.get(close + 1..).unwrap_or_default();
                }
                c if c.is_whitespace() && negate_at.is_none() => {
                    offset += c.len_utf8();
                    rest = rest.get(c.len_utf8()..).unwrap_or_default();
                }
                found => {
                    return Err(TagError::Stray {
                        position: offset,
                        found,
                    });
                }
            }
        }
        if let Some(position) = negate_at {
            return Err(TagError::Stray {
                position,
                found: '~',
            });
        }
        Ok(filter)
    }

    /// Returns `true` when a scenario with `tags` passes the filter.
    #[must_use]
    pub fn matches(&self, tags: &Tags) -> bool {
        if tags.is_hidden() && self.required.is_empty() {
            return false;
        }
        self.required.iter().all(|tag| tags.contains(tag))
            && !self.excluded.iter().any(|tag| tags.contains(tag))
    }
}

/// Decide whether a scenario with `tags` runs under the optional `filter`.
#[must_use]
pub fn selected(tags: &Tags, filter: Option<&TagFilter>) -> bool {
    filter.map_or(!tags.is_hidden(), |filter| filter.matches(tags))
}

/// Splits `input` into bracketed names with their byte offsets.
fn bracketed(input: &str) -> Result<Vec<(usize, &str)>, TagError> {
    let mut names = Vec::new();
    let mut chars = input.char_indices();
    while let Some((position, ch)) = chars.next() {
        match ch {
            '[' => {
                let body_start = position + 1;
                let close = chars
                    .by_ref()
                    .find(|(_, c)| *c == ']')
                    .map(|(index, _)| index)
                    .ok_or(TagError::Unterminated { position })?;
                let name = input.get(body_start..close).unwrap_or_default().trim();
                if name.is_empty() {
                    return Err(TagError::Empty { position });
                }
                names.push((position, name));
            }
            c if c.is_whitespace() => {}
            found => return Err(TagError::Stray { position, found }),
        }
    }
    Ok(names)
}
