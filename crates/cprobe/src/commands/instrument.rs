//! Instrument command.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cprobe::{Instrumented, PlanConfig};
use tracing::{debug, error, info};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal;

/// Log compilation-database options the tree-sitter front-end has no use for.
pub fn note_ignored_options(build_path: Option<&Path>, extra_args: &[String]) {
    if let Some(path) = build_path {
        info!(build_path = %path.display(), "ignoring -p: sources are parsed without a compilation database");
    }
    if !extra_args.is_empty() {
        info!(args = ?extra_args, "ignoring --extra-arg");
    }
}

/// Handle the `instrument` command.
///
/// Each file is handled on its own; a file that fails is reported and
/// skipped, and the exit code reflects whether any file failed.
pub fn cmd_instrument(files: &[PathBuf], output_dir: Option<&Path>, config: &PlanConfig) -> i32 {
    if let Some(dir) = output_dir {
        if let Err(e) = fs::create_dir_all(dir) {
            error!(dir = %dir.display(), error = %e, "cannot create output directory");
            return EXIT_FAILURE;
        }
    }

    let mut failed = 0usize;
    for file in files {
        match process(file, config, output_dir) {
            Ok(()) => debug!(file = %file.display(), "instrumented"),
            Err(e) => {
                error!(file = %file.display(), error = %e, "instrumentation failed");
                terminal::error(&format!("{}: {e}", file.display()));
                failed += 1;
            }
        }
    }

    if failed == 0 {
        EXIT_SUCCESS
    } else {
        terminal::warning(&format!("{failed} of {} files failed", files.len()));
        EXIT_FAILURE
    }
}

fn process(file: &Path, config: &PlanConfig, output_dir: Option<&Path>) -> cprobe::Result<()> {
    let out = cprobe::instrument_file(file, config)?;
    emit(file, &out, output_dir)?;
    Ok(())
}

/// Write one result to stdout, or to `<dir>/<file name>`.
fn emit(file: &Path, out: &Instrumented, output_dir: Option<&Path>) -> io::Result<()> {
    let summary = &out.summary;
    info!(
        file = %file.display(),
        functions = summary.functions.len(),
        returns = summary.return_sites,
        entry_point = summary.entry_point,
        skipped = summary.skipped,
        "instrumented file"
    );

    match output_dir {
        Some(dir) => {
            let name = file.file_name().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "path has no file name")
            })?;
            let dest = dir.join(name);
            fs::write(&dest, &out.source)?;
            terminal::success(&format!(
                "{} ({} functions)",
                file.display(),
                summary.functions.len()
            ));
            terminal::path_output(&dest);
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(out.source.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
