//! CLI argument parsing for Lapso

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "lapso")]
#[command(version)]
#[command(about = "Trace a command and time the interval between its syscall boundaries", long_about = None)]
pub struct Cli {
    /// Append the trace log to FILE instead of stdout
    #[arg(short = 'l', long = "logfile", value_name = "FILE")]
    pub logfile: Option<PathBuf>,

    /// Command to trace; everything after the first token is passed
    /// through verbatim, including flags
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}
