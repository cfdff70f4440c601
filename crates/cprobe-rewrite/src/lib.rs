//! Source-to-source probe insertion for C.
//!
//! The planner walks a [`cprobe_ast::SyntaxTree`] and produces a [`PatchSet`];
//! the [`Compositor`] applies it to the original text and prepends the
//! runtime header include.
//!
//! # Example
//!
//! ```ignore
//! use cprobe_ast::CParser;
//! use cprobe_rewrite::{PatchPlanner, PlanConfig};
//!
//! let unit = CParser::new()?.parse(source)?;
//! let out = PatchPlanner::new(PlanConfig::default()).instrument(&unit)?;
//! print!("{}", out.source);
//! ```

mod compose;
mod config;
mod patch;
mod planner;
mod probe;

pub use compose::*;
pub use config::*;
pub use patch::*;
pub use planner::*;
pub use probe::*;

use cprobe_ast::{SourceLocation, SourceRange};
use thiserror::Error;

/// Patch application errors.
///
/// All of these indicate a planner bug rather than bad input.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("patch location {at} is past the end of the buffer ({len} bytes)")]
    OutOfBounds { at: SourceLocation, len: usize },
    #[error("patch location {0} splits a UTF-8 character")]
    NotCharBoundary(SourceLocation),
    #[error("replacement range {0} ends before it begins")]
    InvertedRange(SourceRange),
    #[error("replacements {0} and {1} overlap")]
    OverlappingReplacements(SourceRange, SourceRange),
    #[error("insertion at {at} falls inside replacement {range}")]
    InsertionInsideReplacement { at: SourceLocation, range: SourceRange },
}

pub type Result<T> = std::result::Result<T, PatchError>;
