//! C front-end for cprobe.
//!
//! Parses one translation unit and exposes the pieces the patch planner
//! anchors on: function definitions with their body and declaration ranges,
//! and the return statements nested inside each body.

mod location;
mod node;
mod parser;

pub use location::*;
pub use node::*;
pub use parser::*;

use thiserror::Error;

/// Front-end errors.
#[derive(Error, Debug)]
pub enum AstError {
    #[error("failed to load C grammar: {0}")]
    Language(String),
    #[error("parse aborted")]
    ParseAborted,
    #[error("syntax error at {line}:{column}")]
    Syntax { line: usize, column: usize },
}

pub type Result<T> = std::result::Result<T, AstError>;
