//! Recorder configuration.

use std::path::PathBuf;

use crate::{RecorderError, Result};

/// Trace file written in the working directory by default.
pub const DEFAULT_TRACE_FILE: &str = "papi_output.csv";

/// Program argument selecting counters: `-trace-papievents=A,B,...`.
pub const COUNTER_FLAG: &str = "-trace-papievents=";

/// Environment variable overriding the trace file path.
pub const TRACE_FILE_ENV: &str = "CPROBE_TRACE_FILE";

/// Environment variable holding the runtime's log filter.
pub const LOG_ENV: &str = "CPROBE_LOG";

/// Recorder configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecorderConfig {
    pub output_path: PathBuf,
    pub counter_flag: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_TRACE_FILE),
            counter_flag: COUNTER_FLAG.to_string(),
        }
    }
}

impl RecorderConfig {
    /// Defaults, with the output path taken from `CPROBE_TRACE_FILE` if set.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = std::env::var_os(TRACE_FILE_ENV).filter(|p| !p.is_empty()) {
            config.output_path = PathBuf::from(path);
        }
        config
    }

    #[must_use]
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Extract the requested counter names from program arguments.
    ///
    /// `args[0]` is the program name and is never inspected. The first
    /// matching argument wins; empty names between commas are dropped.
    ///
    /// # Errors
    ///
    /// Fails if the flag is absent or names no counters.
    pub fn counter_names(&self, args: &[String]) -> Result<Vec<String>> {
        let list = args
            .iter()
            .skip(1)
            .find_map(|arg| arg.strip_prefix(self.counter_flag.as_str()))
            .ok_or_else(|| RecorderError::MissingCounterFlag(self.counter_flag.clone()))?;

        let names: Vec<String> = list
            .split(',')
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();
        if names.is_empty() {
            return Err(RecorderError::EmptyCounterList(self.counter_flag.clone()));
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_counter_names() {
        let config = RecorderConfig::default();
        let names = config
            .counter_names(&args(&["./a.out", "x", "-trace-papievents=PAPI_TOT_INS,,PAPI_TOT_CYC"]))
            .unwrap();
        assert_eq!(names, vec!["PAPI_TOT_INS", "PAPI_TOT_CYC"]);
    }

    #[test]
    fn test_first_flag_wins() {
        let config = RecorderConfig::default();
        let names = config
            .counter_names(&args(&["prog", "-trace-papievents=A", "-trace-papievents=B"]))
            .unwrap();
        assert_eq!(names, vec!["A"]);
    }

    #[test]
    fn test_missing_or_empty_flag() {
        let config = RecorderConfig::default();
        assert!(matches!(
            config.counter_names(&args(&["prog"])),
            Err(RecorderError::MissingCounterFlag(_))
        ));
        // The program name is not an argument.
        assert!(matches!(
            config.counter_names(&args(&["-trace-papievents=A"])),
            Err(RecorderError::MissingCounterFlag(_))
        ));
        assert!(matches!(
            config.counter_names(&args(&["prog", "-trace-papievents=,"])),
            Err(RecorderError::EmptyCounterList(_))
        ));
    }
}
