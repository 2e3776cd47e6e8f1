//! Text report formatting
//!
//! The banners, field widths, nine-digit precision, and the historical
//! "Logest" label are part of the log format consumed downstream; do not
//! reflow them.

use std::io::Write;

use crate::stats::{RunningStats, TraceEvent};
use crate::syscalls;

/// Append-only sink for the trace log
///
/// Writes either to stdout or to a logfile opened in append mode. Any
/// write failure is fatal to the run, so errors propagate unchanged.
pub struct ReportWriter {
    sink: Box<dyn Write>,
}

impl ReportWriter {
    pub fn new(sink: Box<dyn Write>) -> Self {
        Self { sink }
    }

    /// Opening banner, before the first resume
    pub fn start(&mut self) -> std::io::Result<()> {
        write!(self.sink, "\n==========START==========\n\n")
    }

    /// One line per intercepted call boundary
    pub fn event(&mut self, event: &TraceEvent) -> std::io::Result<()> {
        writeln!(
            self.sink,
            "{:4} | {:.9} | {:3} : {:>15} | Duration : {:.9}",
            event.sequence,
            event.elapsed_since_start,
            event.call_number,
            syscalls::syscall_name(event.call_number),
            event.interval_since_previous,
        )
    }

    /// Trailing summary block; the longest-call lines are omitted when no
    /// events were recorded
    pub fn summary(&mut self, stats: &RunningStats) -> std::io::Result<()> {
        write!(self.sink, "\n\n========== SUMMARY ==========\n")?;
        writeln!(self.sink, "Calls : {}", stats.total_events)?;
        if let Some(longest) = &stats.longest {
            writeln!(
                self.sink,
                "Logest syscall : {} | {}",
                longest.sequence,
                syscalls::syscall_name(longest.call_number),
            )?;
            writeln!(self.sink, "Longest syscall time : {:.9}", longest.duration)?;
        }
        self.sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::LongestCall;

    fn render_to_vec<F>(write: F) -> String
    where
        F: FnOnce(&mut ReportWriter) -> std::io::Result<()>,
    {
        let buf = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        struct Shared(std::rc::Rc<std::cell::RefCell<Vec<u8>>>);
        impl Write for Shared {
            fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
                self.0.borrow_mut().extend_from_slice(data);
                Ok(data.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let mut writer = ReportWriter::new(Box::new(Shared(buf.clone())));
        write(&mut writer).unwrap();
        let bytes = buf.borrow().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_event_line_matches_fixed_width_format() {
        let event = TraceEvent {
            sequence: 1,
            elapsed_since_start: 0.000_123_456,
            call_number: 59,
            interval_since_previous: 0.000_000_1,
        };
        let line = render_to_vec(|w| w.event(&event));
        assert_eq!(
            line,
            "   1 | 0.000123456 |  59 :          execve | Duration : 0.000000100\n"
        );
    }

    #[test]
    fn test_event_line_unknown_syscall() {
        let event = TraceEvent {
            sequence: 12,
            elapsed_since_start: 1.5,
            call_number: 9999,
            interval_since_previous: 0.25,
        };
        let line = render_to_vec(|w| w.event(&event));
        assert_eq!(
            line,
            "  12 | 1.500000000 | 9999 :         unknown | Duration : 0.250000000\n"
        );
    }

    #[test]
    fn test_start_banner_verbatim() {
        let banner = render_to_vec(|w| w.start());
        assert_eq!(banner, "\n==========START==========\n\n");
    }

    #[test]
    fn test_summary_with_longest() {
        let stats = RunningStats {
            total_events: 42,
            longest: Some(LongestCall {
                sequence: 7,
                call_number: 0,
                duration: 0.003_21,
            }),
        };
        let text = render_to_vec(|w| w.summary(&stats));
        assert_eq!(
            text,
            "\n\n========== SUMMARY ==========\n\
             Calls : 42\n\
             Logest syscall : 7 | read\n\
             Longest syscall time : 0.003210000\n"
        );
    }

    #[test]
    fn test_sink_write_failure_is_propagated() {
        struct FailingSink;
        impl Write for FailingSink {
            fn write(&mut self, _data: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::WriteZero, "sink closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let event = TraceEvent {
            sequence: 1,
            elapsed_since_start: 0.0,
            call_number: 0,
            interval_since_previous: 0.0,
        };
        let mut writer = ReportWriter::new(Box::new(FailingSink));
        assert!(writer.start().is_err());
        assert!(writer.event(&event).is_err());
        assert!(writer.summary(&RunningStats::default()).is_err());
    }

    #[test]
    fn test_summary_without_events_omits_longest_lines() {
        let stats = RunningStats::default();
        let text = render_to_vec(|w| w.summary(&stats));
        assert_eq!(text, "\n\n========== SUMMARY ==========\nCalls : 0\n");
        assert!(!text.contains("Logest"));
    }
}
