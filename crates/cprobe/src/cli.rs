//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use cprobe::{EntryFinalize, PlanConfig, TrailingExit};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "cprobe")]
#[command(about = "Instrument C sources with hardware-counter probes")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default tracing directive for the chosen verbosity.
    pub const fn log_directive(&self) -> &'static str {
        if self.verbose {
            "cprobe=debug"
        } else if self.silent {
            "cprobe=error"
        } else {
            "cprobe=info"
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Insert probe calls into C source files
    Instrument {
        /// C source files
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Write each result to <DIR>/<file name> instead of stdout
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Build path holding compile_commands.json (accepted, unused)
        #[arg(short = 'p', value_name = "BUILD_PATH")]
        build_path: Option<PathBuf>,

        /// Extra compiler argument (accepted, unused)
        #[arg(long = "extra-arg", value_name = "ARG", allow_hyphen_values = true)]
        extra_args: Vec<String>,

        #[command(flatten)]
        plan: PlanArgs,
    },
    /// Print the runtime header instrumented sources include
    Header {
        /// Write the header to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Summarize a recorded trace per function
    Report {
        /// Trace file written by an instrumented program
        #[arg(value_name = "TRACE", default_value = cprobe::DEFAULT_TRACE_FILE)]
        trace: PathBuf,
    },
    /// List counter names accepted by -trace-papievents=
    Counters,
}

/// Planner options shared by instrumenting commands.
#[derive(clap::Args)]
pub struct PlanArgs {
    /// Runtime header named in the include directive
    #[arg(long, value_name = "NAME", default_value = cprobe::RUNTIME_HEADER_NAME)]
    pub header: String,

    /// Function treated as the program entry point
    #[arg(long, value_name = "NAME", default_value = "main")]
    pub entry_point: String,

    /// Exit call before the closing brace of bodies ending in a return
    #[arg(long, value_enum, default_value = "duplicate")]
    pub trailing_exit: TrailingExitArg,

    /// Where the entry point calls the finalizer
    #[arg(long, value_enum, default_value = "before-trailing-statement")]
    pub entry_finalize: EntryFinalizeArg,

    /// Leave unbraced `if (x) return y;` arms unbraced
    #[arg(long)]
    pub no_brace_returns: bool,
}

impl PlanArgs {
    pub fn to_config(&self) -> PlanConfig {
        PlanConfig::new()
            .with_runtime_header(self.header.clone())
            .with_entry_point(self.entry_point.clone())
            .with_trailing_exit(self.trailing_exit.into())
            .with_entry_finalize(self.entry_finalize.into())
            .with_brace_unbraced_returns(!self.no_brace_returns)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TrailingExitArg {
    /// Keep it, so a trailing return's path calls exit twice
    Duplicate,
    /// Drop it when the last statement is a return
    Elide,
}

impl From<TrailingExitArg> for TrailingExit {
    fn from(arg: TrailingExitArg) -> Self {
        match arg {
            TrailingExitArg::Duplicate => Self::Duplicate,
            TrailingExitArg::Elide => Self::Elide,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum EntryFinalizeArg {
    /// Once, before a trailing return or else before the closing brace
    BeforeTrailingStatement,
    /// Before every return and before a closing brace that can be reached
    EveryReturn,
}

impl From<EntryFinalizeArg> for EntryFinalize {
    fn from(arg: EntryFinalizeArg) -> Self {
        match arg {
            EntryFinalizeArg::BeforeTrailingStatement => Self::BeforeTrailingStatement,
            EntryFinalizeArg::EveryReturn => Self::EveryReturn,
        }
    }
}
