//! cprobe CLI - C source instrumentation

mod cli;
mod commands;
mod terminal;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    // Instrumented source goes to stdout, so logs stay on stderr.
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = cli.log_directive().parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = commands::run_command(&cli);
    std::process::exit(exit_code);
}
