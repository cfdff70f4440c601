//! Trace recorder state machine.
//!
//! ```text
//! Uninitialized --initialize--> Ready --entry--> Counting --exit--> Idle
//!                                 |                 ^                |
//!                                 |                 +-----entry------+
//!                                 +-------------finalize-------------+--> Finalized
//! ```
//!
//! At most one function is measured at a time. An entry while another
//! function is being counted is rejected: the counter group and the half
//! written row both belong to the outer call.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::backend::CounterBackend;
use crate::config::RecorderConfig;
use crate::trace::{Timestamp, TraceWriter};
use crate::{RecorderError, Result};

/// Recorder lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecorderState {
    Uninitialized,
    Ready,
    Counting,
    Idle,
    Finalized,
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Counting => "counting",
            Self::Idle => "idle",
            Self::Finalized => "finalized",
        };
        f.write_str(name)
    }
}

/// Pairs timestamps with counter deltas and writes them as trace rows.
pub struct Recorder<B: CounterBackend, W: Write> {
    backend: B,
    state: RecorderState,
    group: Option<B::Group>,
    counters: Vec<String>,
    values: Vec<i64>,
    trace: Option<TraceWriter<W>>,
    active: Option<String>,
}

impl<B: CounterBackend> Recorder<B, BufWriter<File>> {
    /// Initialize, creating (or truncating) the configured trace file.
    ///
    /// # Errors
    ///
    /// See [`Recorder::initialize_with`].
    pub fn initialize(&mut self, config: &RecorderConfig, args: &[String]) -> Result<()> {
        self.initialize_with(config, args, |path| File::create(path).map(BufWriter::new))
    }
}

impl<B: CounterBackend, W: Write> Recorder<B, W> {
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            state: RecorderState::Uninitialized,
            group: None,
            counters: Vec::new(),
            values: Vec::new(),
            trace: None,
            active: None,
        }
    }

    pub const fn state(&self) -> RecorderState {
        self.state
    }

    /// Counter names in column order.
    pub fn counters(&self) -> &[String] {
        &self.counters
    }

    /// Writer the trace goes to, until finalization.
    pub fn trace(&self) -> Option<&W> {
        self.trace.as_ref().map(TraceWriter::get_ref)
    }

    /// Resolve the requested counters, build the group and write the header.
    ///
    /// Nothing is opened until every counter has resolved and joined the
    /// group.
    ///
    /// # Errors
    ///
    /// Fails if called twice, if the counter flag is missing or empty, if a
    /// counter is unknown or cannot be added, or if the trace cannot be
    /// opened or written.
    pub fn initialize_with<F>(&mut self, config: &RecorderConfig, args: &[String], open: F) -> Result<()>
    where
        F: FnOnce(&Path) -> io::Result<W>,
    {
        if self.state != RecorderState::Uninitialized {
            return Err(self.invalid("initialize"));
        }

        let names = config.counter_names(args)?;
        let codes = names
            .iter()
            .map(|name| {
                self.backend
                    .resolve(name)
                    .ok_or_else(|| RecorderError::UnknownCounter(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut group = self.backend.create_group().map_err(RecorderError::CreateGroup)?;
        for (name, code) in names.iter().zip(codes) {
            self.backend
                .add(&mut group, code)
                .map_err(|source| RecorderError::AddCounter {
                    name: name.clone(),
                    source,
                })?;
            debug!(counter = %name, "added counter");
        }

        let out = open(&config.output_path).map_err(|source| RecorderError::OpenTrace {
            path: config.output_path.clone(),
            source,
        })?;
        let mut trace = TraceWriter::new(out);
        trace.write_header(&names).map_err(RecorderError::WriteTrace)?;

        info!(
            counters = names.len(),
            output = %config.output_path.display(),
            "trace recorder ready"
        );
        self.values = vec![0; names.len()];
        self.counters = names;
        self.group = Some(group);
        self.trace = Some(trace);
        self.state = RecorderState::Ready;
        Ok(())
    }

    /// Start counting for `function` and write the first half of its row.
    ///
    /// # Errors
    ///
    /// Fails if another function is still being measured, if called outside
    /// `Ready`/`Idle`, or if the group cannot be started.
    pub fn function_entry(&mut self, function: &str) -> Result<()> {
        match self.state {
            RecorderState::Ready | RecorderState::Idle => {}
            RecorderState::Counting => {
                return Err(RecorderError::Reentered {
                    outer: self.active.clone().unwrap_or_default(),
                    inner: function.to_string(),
                });
            }
            _ => return Err(self.invalid("function_entry")),
        }
        let (Some(group), Some(trace)) = (self.group.as_mut(), self.trace.as_mut()) else {
            return Err(self.invalid("function_entry"));
        };

        self.backend.start(group).map_err(RecorderError::Start)?;
        let start = Timestamp::now();
        trace
            .begin_row(function, start)
            .map_err(RecorderError::WriteTrace)?;

        debug!(function, %start, "function entry");
        self.state = RecorderState::Counting;
        self.active = Some(function.to_string());
        Ok(())
    }

    /// Stop counting, complete the row, and zero the group.
    ///
    /// # Errors
    ///
    /// Fails if nothing is being measured, or if the group cannot be stopped,
    /// read or reset.
    pub fn function_exit(&mut self, function: &str) -> Result<()> {
        if self.state != RecorderState::Counting {
            return Err(self.invalid("function_exit"));
        }
        let (Some(group), Some(trace)) = (self.group.as_mut(), self.trace.as_mut()) else {
            return Err(self.invalid("function_exit"));
        };

        self.backend
            .stop(group, &mut self.values)
            .map_err(RecorderError::Stop)?;
        let end = Timestamp::now();
        trace
            .end_row(end, &self.values)
            .map_err(RecorderError::WriteTrace)?;
        self.backend.reset(group).map_err(RecorderError::Reset)?;

        if self.active.as_deref() != Some(function) {
            warn!(
                function,
                entered = self.active.as_deref().unwrap_or(""),
                "exit does not match entry; row keeps the entry name"
            );
        }
        debug!(function, %end, values = ?self.values, "function exit");
        self.state = RecorderState::Idle;
        self.active = None;
        Ok(())
    }

    /// Shut the backend down and hand back the flushed trace writer.
    ///
    /// # Errors
    ///
    /// Fails if called outside `Ready`/`Idle` or if the final flush fails.
    pub fn finalize(&mut self) -> Result<W> {
        if !matches!(self.state, RecorderState::Ready | RecorderState::Idle) {
            return Err(self.invalid("finalize"));
        }
        let trace = self.trace.take().ok_or_else(|| self.invalid("finalize"))?;

        self.group = None;
        self.backend.shutdown();
        self.values = Vec::new();
        self.state = RecorderState::Finalized;

        let out = trace.into_inner().map_err(RecorderError::WriteTrace)?;
        info!("trace recorder finalized");
        Ok(out)
    }

    const fn invalid(&self, op: &'static str) -> RecorderError {
        RecorderError::InvalidState {
            op,
            state: self.state,
        }
    }
}
