//! cprobe - hardware-counter instrumentation for C sources
//!
//! Rewrites C translation units so every function reports its entry and exit
//! to the trace recorder in `cprobe-rt`, and summarizes the traces that
//! recorder writes.
//!
//! # Example
//!
//! ```ignore
//! use cprobe::{PlanConfig, instrument_source};
//!
//! let out = instrument_source("int f(void) { return 1; }", &PlanConfig::default())?;
//! assert!(out.source.starts_with("#include \"runtime_library.h\""));
//! ```

pub use cprobe_ast::{AstError, CParser, FunctionNode, ReturnNode, SyntaxTree, TranslationUnit};
pub use cprobe_rewrite::{
    EntryFinalize, Instrumented, PatchError, PatchPlanner, PlanConfig, PlanSummary, ProbeNames,
    TrailingExit,
};
pub use cprobe_rt::{
    COUNTER_NAMES, DEFAULT_TRACE_FILE, RUNTIME_HEADER, RUNTIME_HEADER_NAME, Trace, TraceParseError,
};

pub mod report;

use std::path::Path;

use thiserror::Error;
use tracing::debug;

/// cprobe errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("parse error: {0}")]
    Ast(#[from] AstError),
    #[error("patch error: {0}")]
    Patch(#[from] PatchError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("trace error: {0}")]
    Trace(#[from] TraceParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Instrument one C translation unit held in memory.
///
/// # Errors
///
/// Fails if the source does not parse or the planned patches conflict.
pub fn instrument_source(source: &str, config: &PlanConfig) -> Result<Instrumented> {
    let unit = CParser::new()?.parse(source)?;
    let out = PatchPlanner::new(config.clone()).instrument(&unit)?;
    debug!(
        functions = out.summary.functions.len(),
        returns = out.summary.return_sites,
        "instrumented source"
    );
    Ok(out)
}

/// Read and instrument one C file.
///
/// # Errors
///
/// Fails if the file cannot be read, or as [`instrument_source`].
pub fn instrument_file(path: impl AsRef<Path>, config: &PlanConfig) -> Result<Instrumented> {
    let source = std::fs::read_to_string(path.as_ref())?;
    instrument_source(&source, config)
}
