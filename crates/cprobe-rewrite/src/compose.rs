//! Applies a patch set to the original buffer.

use cprobe_ast::{SourceLocation, SourceRange};
use tracing::debug;

use crate::patch::{Patch, PatchSet};
use crate::{PatchError, Result};

/// Renders a patch set against one file's text.
///
/// Insertions at a replacement's begin land before the replacement text,
/// insertions at its end land after it. An insertion strictly inside a
/// replaced range, or two replacements sharing a byte, is a planner bug and
/// is rejected.
pub struct Compositor<'a> {
    source: &'a str,
    header: Option<String>,
}

impl<'a> Compositor<'a> {
    #[must_use]
    pub const fn new(source: &'a str) -> Self {
        Self {
            source,
            header: None,
        }
    }

    /// Prepend `line` once at the very start of the output.
    #[must_use]
    pub fn with_header(mut self, line: impl Into<String>) -> Self {
        self.header = Some(line.into());
        self
    }

    /// Apply `patches` and return the final buffer.
    ///
    /// # Errors
    ///
    /// Fails if a location is outside the buffer or not on a character
    /// boundary, or if the set violates the non-overlap invariant.
    pub fn compose(&self, patches: &PatchSet) -> Result<String> {
        let mut inserts: Vec<(usize, &str)> = Vec::new();
        let mut replaces: Vec<(SourceRange, &str)> = Vec::new();

        for patch in patches {
            match patch {
                Patch::Insertion { text, .. } => {
                    let at = patch.anchor();
                    self.check(at)?;
                    inserts.push((at.offset(), text.as_str()));
                }
                Patch::Replacement { range, text } => {
                    if range.end < range.begin {
                        return Err(PatchError::InvertedRange(*range));
                    }
                    self.check(range.begin)?;
                    self.check(range.end)?;
                    replaces.push((*range, text.as_str()));
                }
            }
        }

        // Stable: same-location insertions keep emission order.
        inserts.sort_by_key(|&(at, _)| at);
        replaces.sort_by_key(|(range, _)| (range.begin, range.end));

        // Two replacements may only share a begin if both are empty.
        for pair in replaces.windows(2) {
            let (a, b) = (pair[0].0, pair[1].0);
            let shared_begin = a.begin == b.begin && !(a.is_empty() && b.is_empty());
            if shared_begin || a.overlaps(&b) {
                return Err(PatchError::OverlappingReplacements(a, b));
            }
        }
        for &(at, _) in &inserts {
            let loc = SourceLocation::new(at);
            if let Some((range, _)) = replaces.iter().find(|(r, _)| r.strictly_contains(loc)) {
                return Err(PatchError::InsertionInsideReplacement {
                    at: loc,
                    range: *range,
                });
            }
        }

        let added: usize = patches.iter().map(|p| p.text().len()).sum();
        let mut out = String::with_capacity(
            self.source.len() + added + self.header.as_ref().map_or(0, String::len),
        );
        if let Some(header) = &self.header {
            out.push_str(header);
        }

        let mut cursor = 0;
        let mut ins = inserts.iter().peekable();
        let mut rep = replaces.iter().peekable();
        loop {
            let take_insert = match (ins.peek(), rep.peek()) {
                (Some(&&(at, _)), Some(&&(range, _))) => at <= range.begin.offset(),
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            if take_insert {
                if let Some(&(at, text)) = ins.next() {
                    out.push_str(&self.source[cursor..at]);
                    out.push_str(text);
                    cursor = at;
                }
            } else if let Some(&(range, text)) = rep.next() {
                out.push_str(&self.source[cursor..range.begin.offset()]);
                out.push_str(text);
                cursor = range.end.offset();
            }
        }
        out.push_str(&self.source[cursor..]);

        debug!(
            insertions = inserts.len(),
            replacements = replaces.len(),
            bytes = out.len(),
            "composed buffer"
        );
        Ok(out)
    }

    fn check(&self, loc: SourceLocation) -> Result<()> {
        let at = loc.offset();
        if at > self.source.len() {
            return Err(PatchError::OutOfBounds {
                at: loc,
                len: self.source.len(),
            });
        }
        if !self.source.is_char_boundary(at) {
            return Err(PatchError::NotCharBoundary(loc));
        }
        Ok(())
    }
}
