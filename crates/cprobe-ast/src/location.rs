//! Source positions within a single translation unit.

use std::fmt;
use std::ops::{Add, Sub};

/// Byte offset into one file's text.
///
/// Arithmetic saturates at the start of the file; the upper bound is checked
/// when a patch is applied against the buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceLocation(usize);

impl SourceLocation {
    #[must_use]
    pub const fn new(offset: usize) -> Self {
        Self(offset)
    }

    #[must_use]
    pub const fn offset(self) -> usize {
        self.0
    }
}

impl Add<usize> for SourceLocation {
    type Output = Self;

    fn add(self, rhs: usize) -> Self {
        Self(self.0 + rhs)
    }
}

impl Sub<usize> for SourceLocation {
    type Output = Self;

    fn sub(self, rhs: usize) -> Self {
        Self(self.0.saturating_sub(rhs))
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Half-open range `[begin, end)` of source bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceRange {
    pub begin: SourceLocation,
    pub end: SourceLocation,
}

impl SourceRange {
    #[must_use]
    pub const fn new(begin: SourceLocation, end: SourceLocation) -> Self {
        Self { begin, end }
    }

    #[must_use]
    pub const fn from_offsets(begin: usize, end: usize) -> Self {
        Self::new(SourceLocation(begin), SourceLocation(end))
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.0.saturating_sub(self.begin.0)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if `loc` lies strictly between the endpoints.
    #[must_use]
    pub fn strictly_contains(&self, loc: SourceLocation) -> bool {
        self.begin < loc && loc < self.end
    }

    /// True if the two ranges share at least one byte.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.begin < other.end && other.begin < self.end
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}..{}", self.begin.0, self.end.0)
    }
}

/// 1-based line and column, for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

impl LineColumn {
    /// Resolve a byte location against the text it was taken from.
    #[must_use]
    pub fn locate(source: &str, loc: SourceLocation) -> Self {
        let upto = &source.as_bytes()[..loc.0.min(source.len())];
        let line = upto.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = upto.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
        Self {
            line,
            column: upto.len() - line_start + 1,
        }
    }
}

impl fmt::Display for LineColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
