use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use lapso::{cli::Cli, report::ReportWriter, tracer};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
///
/// Diagnostics go to stderr (gated by RUST_LOG) so they never mix with
/// the report stream on stdout.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Open the report sink: the logfile in append mode, or stdout
fn open_sink(logfile: Option<&Path>) -> Result<Box<dyn Write>> {
    match logfile {
        Some(path) => {
            let file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(std::io::stdout())),
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing();

    if args.command.is_empty() {
        anyhow::bail!("Missing command to trace. Usage: lapso [-l FILE] COMMAND [ARGS...]");
    }

    let mut report = ReportWriter::new(open_sink(args.logfile.as_deref())?);
    tracer::trace_command(&args.command, &mut report)?;

    Ok(())
}
