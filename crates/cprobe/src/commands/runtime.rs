//! Header and counters commands.

use std::path::Path;

use cprobe::{COUNTER_NAMES, RUNTIME_HEADER};
use tracing::error;

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal::{self, Table};

/// Handle the `header` command.
pub fn cmd_header(output: Option<&Path>) -> i32 {
    let Some(path) = output else {
        print!("{RUNTIME_HEADER}");
        return EXIT_SUCCESS;
    };
    match std::fs::write(path, RUNTIME_HEADER) {
        Ok(()) => {
            terminal::success("wrote runtime header");
            terminal::path_output(path);
            EXIT_SUCCESS
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to write header");
            EXIT_FAILURE
        }
    }
}

/// Handle the `counters` command.
pub fn cmd_counters() -> i32 {
    let mut table = Table::new(vec!["name".into(), "event".into(), "kind".into()]);
    for (name, id) in COUNTER_NAMES {
        let kind = if id.is_hardware() { "hardware" } else { "software" };
        table.add_row(vec![(*name).to_string(), id.to_string(), kind.to_string()]);
    }
    table.print();
    EXIT_SUCCESS
}
