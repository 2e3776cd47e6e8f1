//! Running aggregate over the trace event stream

/// One intercepted call boundary
///
/// Immutable once produced; `sequence` starts at 1 and the suppressed
/// post-exec synchronization stop never becomes an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceEvent {
    pub sequence: u64,
    /// Seconds since the trace loop started
    pub elapsed_since_start: f64,
    pub call_number: i64,
    /// Seconds since the previous boundary
    pub interval_since_previous: f64,
}

/// The maximum-interval event seen so far
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LongestCall {
    pub sequence: u64,
    pub call_number: i64,
    pub duration: f64,
}

/// Aggregate state: event count plus the longest interval
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningStats {
    pub total_events: u64,
    pub longest: Option<LongestCall>,
}

/// Accumulates [`RunningStats`] over the event stream
///
/// Owned by the trace loop; mutated only between resume steps, so no
/// synchronization is needed.
#[derive(Debug, Default)]
pub struct StatsAccumulator {
    stats: RunningStats,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event
    ///
    /// `longest` is replaced only on a strictly greater interval, so a
    /// tie keeps the earliest event.
    pub fn record(&mut self, event: &TraceEvent) {
        self.stats.total_events += 1;
        let beats_current = self
            .stats
            .longest
            .is_none_or(|longest| event.interval_since_previous > longest.duration);
        if beats_current {
            self.stats.longest = Some(LongestCall {
                sequence: event.sequence,
                call_number: event.call_number,
                duration: event.interval_since_previous,
            });
        }
    }

    /// Current aggregate; valid mid-trace as well as at the end
    pub fn summary(&self) -> &RunningStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn event(sequence: u64, call_number: i64, interval: f64) -> TraceEvent {
        TraceEvent {
            sequence,
            elapsed_since_start: 0.0,
            call_number,
            interval_since_previous: interval,
        }
    }

    #[test]
    fn test_empty_accumulator() {
        let acc = StatsAccumulator::new();
        assert_eq!(acc.summary().total_events, 0);
        assert!(acc.summary().longest.is_none());
    }

    #[test]
    fn test_single_event_becomes_longest() {
        let mut acc = StatsAccumulator::new();
        acc.record(&event(1, 59, 0.000_1));
        let summary = acc.summary();
        assert_eq!(summary.total_events, 1);
        let longest = summary.longest.unwrap();
        assert_eq!(longest.sequence, 1);
        assert_eq!(longest.call_number, 59);
        assert_eq!(longest.duration, 0.000_1);
    }

    #[test]
    fn test_longest_tracks_strict_maximum() {
        let mut acc = StatsAccumulator::new();
        acc.record(&event(1, 0, 0.001));
        acc.record(&event(2, 1, 0.005));
        acc.record(&event(3, 3, 0.002));
        let summary = acc.summary();
        assert_eq!(summary.total_events, 3);
        assert_eq!(summary.longest.unwrap().sequence, 2);
        assert_eq!(summary.longest.unwrap().call_number, 1);
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let mut acc = StatsAccumulator::new();
        acc.record(&event(1, 0, 0.004));
        acc.record(&event(2, 1, 0.004));
        assert_eq!(acc.summary().longest.unwrap().sequence, 1);
    }

    #[test]
    fn test_zero_duration_event_still_counted() {
        let mut acc = StatsAccumulator::new();
        acc.record(&event(1, 12, 0.0));
        assert_eq!(acc.summary().total_events, 1);
        assert_eq!(acc.summary().longest.unwrap().duration, 0.0);
    }

    proptest! {
        #[test]
        fn prop_longest_dominates_all_intervals(intervals in prop::collection::vec(0.0f64..1.0, 1..64)) {
            let mut acc = StatsAccumulator::new();
            for (i, &interval) in intervals.iter().enumerate() {
                acc.record(&event(i as u64 + 1, 0, interval));
            }
            let summary = acc.summary();
            prop_assert_eq!(summary.total_events, intervals.len() as u64);
            let longest = summary.longest.unwrap();
            for &interval in &intervals {
                prop_assert!(longest.duration >= interval);
            }
            // First index at which the maximum occurs wins ties
            let first_max = intervals
                .iter()
                .position(|&d| d == longest.duration)
                .unwrap() as u64
                + 1;
            prop_assert_eq!(longest.sequence, first_max);
        }
    }
}
