//! Styled status lines and tables for CLI output.
//!
//! Status lines go to stderr so stdout only carries command output.

use std::io::{self, Write};
use std::path::Path;

use console::style;

/// Print a success message to stderr.
pub fn success(message: &str) {
    eprintln!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message to stderr.
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a warning message to stderr.
pub fn warning(message: &str) {
    eprintln!("{} {}", style("!").yellow().bold(), message);
}

/// Print a path output (like "-> /path/to/file").
pub fn path_output(path: &Path) {
    eprintln!("  {} {}", style("→").dim(), style(path.display()).dim());
}

/// Column alignment.
#[derive(Clone, Copy, Default)]
pub enum Alignment {
    #[default]
    Left,
    Right,
}

/// Plain-text table with padded columns.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    alignments: Vec<Alignment>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        let count = headers.len();
        Self {
            headers,
            rows: Vec::new(),
            alignments: vec![Alignment::Left; count],
        }
    }

    /// Right-align every column from `first` on.
    pub fn numeric_from(mut self, first: usize) -> Self {
        for align in self.alignments.iter_mut().skip(first) {
            *align = Alignment::Right;
        }
        self
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(String::len).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.len());
            }
        }

        let mut output = String::new();
        self.push_line(&mut output, &self.headers, &widths);
        let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
        self.push_line(&mut output, &rule, &widths);
        for row in &self.rows {
            self.push_line(&mut output, row, &widths);
        }
        output
    }

    fn push_line(&self, output: &mut String, cells: &[String], widths: &[usize]) {
        let line: Vec<String> = cells
            .iter()
            .zip(widths)
            .zip(&self.alignments)
            .map(|((cell, &w), align)| match align {
                Alignment::Left => format!("{cell:<w$}"),
                Alignment::Right => format!("{cell:>w$}"),
            })
            .collect();
        output.push_str(line.join("  ").trim_end());
        output.push('\n');
    }

    /// Print the table to stdout.
    pub fn print(&self) {
        print!("{}", self.render());
        let _ = io::stdout().flush();
    }
}
