//! Report command.

use std::path::Path;

use cprobe::report::{TraceReport, format_nanos};
use tracing::error;

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal::{self, Table};

/// Handle the `report` command.
pub fn cmd_report(trace: &Path) -> i32 {
    let report = match TraceReport::load(trace) {
        Ok(report) => report,
        Err(e) => {
            error!(trace = %trace.display(), error = %e, "failed to read trace");
            return EXIT_FAILURE;
        }
    };

    let mut headers: Vec<String> = ["function", "calls", "total", "mean"]
        .iter()
        .map(|h| (*h).to_string())
        .collect();
    headers.extend(report.counters.iter().cloned());

    let mut table = Table::new(headers).numeric_from(1);
    for f in &report.functions {
        let mut row = vec![
            f.name.clone(),
            f.calls.to_string(),
            format_nanos(f.total_nanos),
            format_nanos(f.mean_nanos()),
        ];
        row.extend(f.counters.iter().map(i64::to_string));
        table.add_row(row);
    }
    table.print();

    terminal::success(&format!(
        "{} calls across {} functions",
        report.total_calls(),
        report.functions.len()
    ));
    if report.incomplete > 0 {
        terminal::warning(&format!(
            "{} incomplete rows (run aborted between entry and exit?)",
            report.incomplete
        ));
    }
    EXIT_SUCCESS
}
