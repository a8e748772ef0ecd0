//! Character-offset spans and containment rules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How span boundaries are treated by [`Span::contains`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// `start <= offset < after_end`
    Strict,
    /// `start <= offset <= after_end`, so the position right after the span
    /// still counts (a cursor sitting at the end of a token)
    Extended,
    /// `start < offset < after_end`, strictly inside. Used for resources whose
    /// own boundaries are the braces delimiting them.
    Enclosed,
}

/// A run of characters in a document, `[start, start + length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Offset of the first character
    pub start: usize,
    /// Number of characters
    pub length: usize,
}

impl Span {
    /// Create a span from a start offset and a length.
    #[must_use]
    pub const fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Create a span from `[start, after_end)`.
    ///
    /// # Panics
    ///
    /// Panics if `after_end < start`.
    #[must_use]
    pub fn from_bounds(start: usize, after_end: usize) -> Self {
        assert!(after_end >= start, "span end {after_end} precedes start {start}");
        Self::new(start, after_end - start)
    }

    /// Offset just past the last character, saturating at `usize::MAX`.
    #[must_use]
    pub const fn after_end(&self) -> usize {
        self.start.saturating_add(self.length)
    }

    /// Offset just past the last character, `None` if it does not fit in a
    /// `usize`.
    #[must_use]
    pub const fn checked_after_end(&self) -> Option<usize> {
        self.start.checked_add(self.length)
    }

    /// Whether `offset` falls inside the span under the given rule.
    #[must_use]
    pub fn contains(&self, offset: usize, containment: Containment) -> bool {
        match containment {
            Containment::Strict => self.start <= offset && offset < self.after_end(),
            Containment::Extended => self.start <= offset && offset <= self.after_end(),
            Containment::Enclosed => self.start < offset && offset < self.after_end(),
        }
    }

    /// Whether `other` lies entirely within this span.
    #[must_use]
    pub fn encloses(&self, other: &Span) -> bool {
        self.start <= other.start && other.after_end() <= self.after_end()
    }

    /// Whether the two spans share at least one character.
    #[must_use]
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.after_end() && other.start < self.after_end()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.after_end())
    }
}
