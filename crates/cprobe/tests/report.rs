//! Trace summaries from files written by the recorder.

use std::fs;
use std::process::Command;

use cprobe::report::TraceReport;
use cprobe_rt::{CounterBackend, Recorder, RecorderConfig};

/// Backend that counts calls instead of hardware events.
#[derive(Default)]
struct CallCounter {
    calls: i64,
}

impl CounterBackend for CallCounter {
    type Code = ();
    type Group = ();

    fn resolve(&mut self, name: &str) -> Option<()> {
        (name == "calls").then_some(())
    }

    fn create_group(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn add(&mut self, _group: &mut (), _code: ()) -> std::io::Result<()> {
        Ok(())
    }

    fn start(&mut self, _group: &mut ()) -> std::io::Result<()> {
        self.calls += 1;
        Ok(())
    }

    fn stop(&mut self, _group: &mut (), values: &mut [i64]) -> std::io::Result<()> {
        values[0] = self.calls;
        Ok(())
    }

    fn reset(&mut self, _group: &mut ()) -> std::io::Result<()> {
        Ok(())
    }

    fn shutdown(&mut self) {}
}

fn record(path: &std::path::Path, calls: &[&str]) {
    let config = RecorderConfig::default().with_output_path(path);
    let args = vec!["prog".to_string(), "-trace-papievents=calls".to_string()];
    let mut recorder = Recorder::new(CallCounter::default());
    recorder.initialize(&config, &args).unwrap();
    for name in calls {
        recorder.function_entry(name).unwrap();
        recorder.function_exit(name).unwrap();
    }
    recorder.finalize().unwrap();
}

#[test]
fn report_from_recorded_trace() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("papi_output.csv");
    record(&path, &["add", "clamp", "add", "report"]);

    let report = TraceReport::load(&path).unwrap();
    assert_eq!(report.counters, vec!["calls"]);
    assert_eq!(report.total_calls(), 4);
    assert_eq!(report.incomplete, 0);

    let add = report.functions.iter().find(|f| f.name == "add").unwrap();
    assert_eq!(add.calls, 2);
    // The counter is the running call number at each exit: 1 and 3.
    assert_eq!(add.counters, vec![4]);
}

#[test]
fn report_counts_aborted_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("papi_output.csv");
    record(&path, &["add"]);
    let mut text = fs::read_to_string(&path).unwrap();
    text.push_str("fact,1700000000.000000000");
    fs::write(&path, text).unwrap();

    let report = TraceReport::load(&path).unwrap();
    assert_eq!(report.incomplete, 1);
    assert_eq!(report.total_calls(), 1);
}

#[test]
fn cli_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.csv");
    record(&path, &["add", "add"]);

    let output = Command::new(env!("CARGO_BIN_EXE_cprobe"))
        .arg("report")
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let mut lines = stdout.lines();
    assert!(lines.next().unwrap().starts_with("function"));
    assert!(lines.nth(1).unwrap().starts_with("add"));

    let missing = Command::new(env!("CARGO_BIN_EXE_cprobe"))
        .arg("report")
        .arg(dir.path().join("absent.csv"))
        .output()
        .unwrap();
    assert!(!missing.status.success());
}
