//! Lapso - minimal ptrace syscall interval tracer
//!
//! This library provides the core functionality for launching a command
//! under ptrace, timing the interval between successive syscall stops,
//! and writing a chronological log with a count/longest-call summary.

pub mod cli;
pub mod clock;
pub mod errors;
pub mod report;
pub mod stats;
pub mod syscalls;
pub mod tracer;
