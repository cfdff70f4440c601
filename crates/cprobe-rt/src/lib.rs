//! Trace recorder for cprobe-instrumented C programs.
//!
//! Instrumented sources call the four C entry points in [`ffi`]. The recorder
//! reads the counter list from `-trace-papievents=`, measures one function
//! invocation at a time with a single counter group, and writes one CSV row
//! per completed invocation.

mod backend;
mod config;
mod counters;
pub mod ffi;
mod perf;
mod recorder;
mod trace;

pub use backend::CounterBackend;
pub use config::*;
pub use counters::*;
pub use ffi::{RUNTIME_HEADER, RUNTIME_HEADER_NAME};
pub use perf::{PerfBackend, PerfGroup};
pub use recorder::*;
pub use trace::*;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Recorder errors.
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("no counters requested: pass {0}<name>,<name>,...")]
    MissingCounterFlag(String),
    #[error("{0} names no counters")]
    EmptyCounterList(String),
    #[error("unknown counter: {0}")]
    UnknownCounter(String),
    #[error("failed to create counter group: {0}")]
    CreateGroup(#[source] io::Error),
    #[error("failed to add counter {name}: {source}")]
    AddCounter {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to start counters: {0}")]
    Start(#[source] io::Error),
    #[error("failed to stop counters: {0}")]
    Stop(#[source] io::Error),
    #[error("failed to reset counters: {0}")]
    Reset(#[source] io::Error),
    #[error("failed to open trace file {}: {source}", path.display())]
    OpenTrace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write trace: {0}")]
    WriteTrace(#[source] io::Error),
    #[error("{op} called while {state}")]
    InvalidState {
        op: &'static str,
        state: RecorderState,
    },
    #[error("{inner} entered while {outer} is still being measured")]
    Reentered { outer: String, inner: String },
}

pub type Result<T> = std::result::Result<T, RecorderError>;
