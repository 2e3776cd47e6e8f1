//! Error taxonomy for a trace session

use thiserror::Error;

/// Errors raised while spawning and driving the traced process
#[derive(Error, Debug)]
pub enum TraceError {
    /// Fork or initial trace handoff failed; no child remains to trace
    #[error("Failed to spawn traced process: {0}")]
    Spawn(#[source] nix::Error),

    /// A ptrace resume/wait/register-read failed after tracing began
    #[error("Trace control failed ({context}): {source}")]
    TraceControl {
        context: &'static str,
        #[source]
        source: nix::Error,
    },

    /// The report sink became unwritable
    #[error("Failed to write trace output: {0}")]
    Output(#[from] std::io::Error),
}

impl TraceError {
    pub(crate) fn control(context: &'static str, source: nix::Error) -> Self {
        Self::TraceControl { context, source }
    }
}

pub type Result<T> = std::result::Result<T, TraceError>;
