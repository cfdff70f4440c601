//! Per-function summaries of recorded traces.

use std::path::Path;

use rustc_hash::FxHashMap;

use crate::{Result, Trace};

/// Aggregate of every completed invocation of one function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionStats {
    pub name: String,
    pub calls: u64,
    pub total_nanos: u64,
    /// Per-counter sums, in trace column order.
    pub counters: Vec<i64>,
}

impl FunctionStats {
    #[must_use]
    pub const fn mean_nanos(&self) -> u64 {
        if self.calls == 0 { 0 } else { self.total_nanos / self.calls }
    }
}

/// Summary of one trace file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceReport {
    pub counters: Vec<String>,
    /// Sorted by total time, longest first.
    pub functions: Vec<FunctionStats>,
    /// Rows with no matching exit, typically left by an aborted run.
    pub incomplete: usize,
}

impl TraceReport {
    /// Aggregate a parsed trace.
    #[must_use]
    pub fn from_trace(trace: &Trace) -> Self {
        let mut index: FxHashMap<&str, usize> = FxHashMap::default();
        let mut functions: Vec<FunctionStats> = Vec::new();

        for row in &trace.rows {
            let slot = *index.entry(row.function.as_str()).or_insert_with(|| {
                functions.push(FunctionStats {
                    name: row.function.clone(),
                    calls: 0,
                    total_nanos: 0,
                    counters: vec![0; trace.counters.len()],
                });
                functions.len() - 1
            });
            let stats = &mut functions[slot];
            stats.calls += 1;
            stats.total_nanos = stats.total_nanos.saturating_add(row.wall_nanos());
            for (sum, v) in stats.counters.iter_mut().zip(&row.counters) {
                *sum = sum.saturating_add(*v);
            }
        }

        functions.sort_by(|a, b| {
            b.total_nanos
                .cmp(&a.total_nanos)
                .then_with(|| a.name.cmp(&b.name))
        });

        Self {
            counters: trace.counters.clone(),
            functions,
            incomplete: trace.incomplete.len(),
        }
    }

    /// Read, parse and aggregate a trace file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or has no valid header row.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_trace(&Trace::parse(&text)?))
    }

    /// Completed invocations across all functions.
    #[must_use]
    pub fn total_calls(&self) -> u64 {
        self.functions.iter().map(|f| f.calls).sum()
    }
}

/// Human-readable duration with three significant decimals.
#[must_use]
pub fn format_nanos(nanos: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let n = nanos as f64;
    if nanos < 1_000 {
        format!("{nanos} ns")
    } else if nanos < 1_000_000 {
        format!("{:.3} us", n / 1e3)
    } else if nanos < 1_000_000_000 {
        format!("{:.3} ms", n / 1e6)
    } else {
        format!("{:.3} s", n / 1e9)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = "function_name,start_timestamp,end_timestamp,PAPI_TOT_INS,PAPI_TOT_CYC\n\
                         add,10.000000000,10.000000100,50,70\n\
                         main_loop,10.000000200,10.000005200,900,1200\n\
                         add,10.000006000,10.000006300,40,60\n\
                         fact,10.000007000";

    #[test]
    fn test_aggregate() {
        let report = TraceReport::from_trace(&Trace::parse(TRACE).unwrap());
        assert_eq!(report.counters, vec!["PAPI_TOT_INS", "PAPI_TOT_CYC"]);
        assert_eq!(report.incomplete, 1);
        assert_eq!(report.total_calls(), 3);

        let names: Vec<&str> = report.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["main_loop", "add"]);

        let add = &report.functions[1];
        assert_eq!(add.calls, 2);
        assert_eq!(add.total_nanos, 400);
        assert_eq!(add.mean_nanos(), 200);
        assert_eq!(add.counters, vec![90, 130]);
    }

    #[test]
    fn test_ties_sorted_by_name() {
        let text = "function_name,start_timestamp,end_timestamp\n\
                    b,1.000000000,1.000000010\n\
                    a,2.000000000,2.000000010\n";
        let report = TraceReport::from_trace(&Trace::parse(text).unwrap());
        assert_eq!(report.functions[0].name, "a");
        assert!(report.functions[0].counters.is_empty());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("papi_output.csv");
        std::fs::write(&path, TRACE).unwrap();
        assert_eq!(TraceReport::load(&path).unwrap().functions.len(), 2);

        std::fs::write(&path, "not a trace\n").unwrap();
        assert!(matches!(TraceReport::load(&path), Err(crate::Error::Trace(_))));
    }

    #[test]
    fn test_format_nanos() {
        assert_eq!(format_nanos(999), "999 ns");
        assert_eq!(format_nanos(1_500), "1.500 us");
        assert_eq!(format_nanos(2_000_000), "2.000 ms");
        assert_eq!(format_nanos(3_250_000_000), "3.250 s");
    }
}
