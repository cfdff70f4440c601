//! Text edits anchored to source locations.

use cprobe_ast::{SourceLocation, SourceRange};

/// One text edit against the original buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Patch {
    /// Insert `text` before the byte at `at`.
    Insertion { at: SourceLocation, text: String },
    /// Replace the bytes in `range` with `text`.
    Replacement { range: SourceRange, text: String },
}

impl Patch {
    /// Location the edit starts at.
    #[must_use]
    pub const fn anchor(&self) -> SourceLocation {
        match self {
            Self::Insertion { at, .. } => *at,
            Self::Replacement { range, .. } => range.begin,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Insertion { text, .. } | Self::Replacement { text, .. } => text,
        }
    }
}

/// Ordered patches for one file.
///
/// Insertions at the same location apply in the order they were added.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatchSet {
    patches: Vec<Patch>,
}

impl PatchSet {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            patches: Vec::new(),
        }
    }

    pub fn insert(&mut self, at: SourceLocation, text: impl Into<String>) {
        self.patches.push(Patch::Insertion {
            at,
            text: text.into(),
        });
    }

    pub fn replace(&mut self, range: SourceRange, text: impl Into<String>) {
        self.patches.push(Patch::Replacement {
            range,
            text: text.into(),
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Patch> {
        self.patches.iter()
    }
}

impl<'a> IntoIterator for &'a PatchSet {
    type Item = &'a Patch;
    type IntoIter = std::slice::Iter<'a, Patch>;

    fn into_iter(self) -> Self::IntoIter {
        self.patches.iter()
    }
}
