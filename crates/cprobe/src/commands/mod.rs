//! Command implementations.
//!
//! Each submodule handles one CLI command and returns a process exit code.

mod instrument;
mod report;
mod runtime;

use crate::cli::{Cli, Commands};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Instrument {
            files,
            output_dir,
            build_path,
            extra_args,
            plan,
        } => {
            instrument::note_ignored_options(build_path.as_deref(), extra_args);
            instrument::cmd_instrument(files, output_dir.as_deref(), &plan.to_config())
        }
        Commands::Header { output } => runtime::cmd_header(output.as_deref()),
        Commands::Report { trace } => report::cmd_report(trace),
        Commands::Counters => runtime::cmd_counters(),
    }
}
