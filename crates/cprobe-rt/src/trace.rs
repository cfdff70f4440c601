//! CSV trace format.
//!
//! ```text
//! function_name,start_timestamp,end_timestamp,<counter1>,...,<counterN>
//! add,1718000000.000012345,1718000000.000013001,812,1203
//! ```
//!
//! Timestamps are wall-clock `seconds.nanoseconds`. Each row is written in
//! two flushed halves: the name and start time on entry, the rest on exit.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;

/// Fixed leading columns of the header row.
pub const HEADER_PREFIX: &str = "function_name,start_timestamp,end_timestamp";

/// Wall-clock instant with nanosecond resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    pub secs: u64,
    pub nanos: u32,
}

impl Timestamp {
    #[must_use]
    pub fn now() -> Self {
        let since = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self::from(since)
    }

    /// Nanoseconds from `self` to `later`, zero if `later` is earlier.
    #[must_use]
    pub fn nanos_until(self, later: Self) -> u64 {
        let a = Duration::from(self);
        let b = Duration::from(later);
        u64::try_from(b.saturating_sub(a).as_nanos()).unwrap_or(u64::MAX)
    }
}

impl From<Duration> for Timestamp {
    fn from(d: Duration) -> Self {
        Self {
            secs: d.as_secs(),
            nanos: d.subsec_nanos(),
        }
    }
}

impl From<Timestamp> for Duration {
    fn from(ts: Timestamp) -> Self {
        Self::new(ts.secs, ts.nanos)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.secs, self.nanos)
    }
}

impl FromStr for Timestamp {
    type Err = TraceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || TraceParseError::BadTimestamp(s.to_string());
        let (secs, nanos) = s.split_once('.').ok_or_else(bad)?;
        if nanos.len() != 9 {
            return Err(bad());
        }
        Ok(Self {
            secs: secs.parse().map_err(|_| bad())?,
            nanos: nanos.parse().map_err(|_| bad())?,
        })
    }
}

/// Writes trace rows, flushing after every half row.
pub struct TraceWriter<W: Write> {
    out: W,
}

impl<W: Write> TraceWriter<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Header row: fixed columns, then one column per counter.
    ///
    /// # Errors
    ///
    /// Propagates write and flush failures, as do the other writers below.
    pub fn write_header(&mut self, counters: &[String]) -> io::Result<()> {
        self.out.write_all(HEADER_PREFIX.as_bytes())?;
        for name in counters {
            write!(self.out, ",{name}")?;
        }
        self.out.write_all(b"\n")?;
        self.out.flush()
    }

    /// First half of a row. No trailing newline.
    pub fn begin_row(&mut self, function: &str, start: Timestamp) -> io::Result<()> {
        write!(self.out, "{function},{start}")?;
        self.out.flush()
    }

    /// Second half of a row: end time, counter values, newline.
    pub fn end_row(&mut self, end: Timestamp, values: &[i64]) -> io::Result<()> {
        write!(self.out, ",{end}")?;
        for v in values {
            write!(self.out, ",{v}")?;
        }
        self.out.write_all(b"\n")?;
        self.out.flush()
    }

    pub const fn get_ref(&self) -> &W {
        &self.out
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Trace parsing errors.
#[derive(Error, Debug)]
pub enum TraceParseError {
    #[error("trace is empty")]
    Empty,
    #[error("unexpected header row: {0}")]
    BadHeader(String),
    #[error("invalid timestamp: {0}")]
    BadTimestamp(String),
}

/// One completed function invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceRow {
    pub function: String,
    pub start: Timestamp,
    pub end: Timestamp,
    pub counters: Vec<i64>,
}

impl TraceRow {
    #[must_use]
    pub fn wall_nanos(&self) -> u64 {
        self.start.nanos_until(self.end)
    }
}

/// A parsed trace file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    pub counters: Vec<String>,
    pub rows: Vec<TraceRow>,
    /// Lines that are not complete rows, such as the half row left behind
    /// when the recorder aborted between entry and exit.
    pub incomplete: Vec<String>,
}

impl Trace {
    /// Parse a trace file's contents.
    ///
    /// # Errors
    ///
    /// Fails if the header row is missing or malformed. Malformed data rows
    /// are collected in [`Trace::incomplete`] instead.
    pub fn parse(text: &str) -> Result<Self, TraceParseError> {
        let mut lines = text.lines();
        let header = lines.next().ok_or(TraceParseError::Empty)?;
        let counters = header
            .strip_prefix(HEADER_PREFIX)
            .filter(|rest| rest.is_empty() || rest.starts_with(','))
            .ok_or_else(|| TraceParseError::BadHeader(header.to_string()))?
            .split(',')
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut trace = Self {
            counters,
            ..Self::default()
        };
        for line in lines.filter(|l| !l.is_empty()) {
            match parse_row(line, trace.counters.len()) {
                Some(row) => trace.rows.push(row),
                None => trace.incomplete.push(line.to_string()),
            }
        }
        Ok(trace)
    }
}

fn parse_row(line: &str, num_counters: usize) -> Option<TraceRow> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 3 + num_counters || fields[0].is_empty() {
        return None;
    }
    Some(TraceRow {
        function: fields[0].to_string(),
        start: fields[1].parse().ok()?,
        end: fields[2].parse().ok()?,
        counters: fields[3..]
            .iter()
            .map(|v| v.parse().ok())
            .collect::<Option<Vec<i64>>>()?,
    })
}
