//! Grouping of consecutive same-timestamp lines into speed measurements.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::timestamp::{Timestamp, TimestampFormat};
use crate::error::{MonitorError, Result};

/// Number of lines observed bearing one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedMeasurement {
    pub timestamp: Timestamp,
    pub count: usize,
}

/// State of the grouping state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupState {
    /// No timestamp has been parsed yet.
    Uninitialized,
    /// A group is in progress. `lines` is never empty.
    Accumulating {
        timestamp: Timestamp,
        lines: Vec<String>,
    },
    /// The source ended; nothing further is processed.
    Terminated,
}

/// Folds a stream of lines into [`SpeedMeasurement`]s.
///
/// A measurement is emitted only when a line with a different timestamp
/// arrives, so the group in progress when the stream ends is never
/// reported unless explicitly drained.
#[derive(Debug)]
pub struct GroupingEngine {
    format: TimestampFormat,
    state: GroupState,
    lines_seen: u64,
    lines_skipped: u64,
}

impl GroupingEngine {
    pub fn new(format: TimestampFormat) -> Self {
        Self {
            format,
            state: GroupState::Uninitialized,
            lines_seen: 0,
            lines_skipped: 0,
        }
    }

    pub fn state(&self) -> &GroupState {
        &self.state
    }

    pub fn is_initialized(&self) -> bool {
        !matches!(self.state, GroupState::Uninitialized)
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, GroupState::Terminated)
    }

    /// Timestamp of the group in progress.
    pub fn current_timestamp(&self) -> Option<Timestamp> {
        match &self.state {
            GroupState::Accumulating { timestamp, .. } => Some(*timestamp),
            _ => None,
        }
    }

    /// Number of lines in the group in progress.
    pub fn current_group_len(&self) -> usize {
        match &self.state {
            GroupState::Accumulating { lines, .. } => lines.len(),
            _ => 0,
        }
    }

    /// Lines handed to the engine so far.
    pub fn lines_seen(&self) -> u64 {
        self.lines_seen
    }

    /// Lines dropped because they carried no timestamp.
    pub fn lines_skipped(&self) -> u64 {
        self.lines_skipped
    }

    /// Open the first group from the first parseable line of `lines`.
    ///
    /// Returns the index of that line, or `None` if no line parsed (the
    /// engine stays uninitialized). Lines before the returned index are
    /// consumed as skipped; lines after it are left for [`feed`](Self::feed).
    ///
    /// Calling this once a group exists is a sequencing bug and fails with
    /// [`MonitorError::InvalidState`].
    pub fn initialize(&mut self, lines: &[String]) -> Result<Option<usize>> {
        if self.is_initialized() {
            return Err(MonitorError::InvalidState(
                "initial timestamp search on an initialized engine",
            ));
        }

        for (index, line) in lines.iter().enumerate() {
            self.lines_seen += 1;
            match self.format.parse(line) {
                Ok(timestamp) => {
                    self.state = GroupState::Accumulating {
                        timestamp,
                        lines: vec![line.clone()],
                    };
                    return Ok(Some(index));
                }
                Err(e) => {
                    self.lines_skipped += 1;
                    trace!(error = %e, "Skipping line before first timestamp");
                }
            }
        }

        Ok(None)
    }

    /// Process one line, returning the measurement it completed, if any.
    pub fn feed(&mut self, line: String) -> Option<SpeedMeasurement> {
        if self.is_terminated() {
            return None;
        }

        self.lines_seen += 1;
        let timestamp = match self.format.parse(&line) {
            Ok(timestamp) => timestamp,
            Err(e) => {
                self.lines_skipped += 1;
                trace!(error = %e, "Skipping line");
                return None;
            }
        };

        match &mut self.state {
            GroupState::Accumulating {
                timestamp: current,
                lines,
            } => {
                if *current == timestamp {
                    lines.push(line);
                    return None;
                }

                let finished = SpeedMeasurement {
                    timestamp: *current,
                    count: lines.len(),
                };
                *current = timestamp;
                *lines = vec![line];
                Some(finished)
            }
            GroupState::Uninitialized => {
                self.state = GroupState::Accumulating {
                    timestamp,
                    lines: vec![line],
                };
                None
            }
            GroupState::Terminated => None,
        }
    }

    /// Emit the group in progress and return to the uninitialized state.
    pub fn drain(&mut self) -> Option<SpeedMeasurement> {
        match std::mem::replace(&mut self.state, GroupState::Uninitialized) {
            GroupState::Accumulating { timestamp, lines } => Some(SpeedMeasurement {
                timestamp,
                count: lines.len(),
            }),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Stop processing. Returns the size of the discarded group, if any.
    pub fn terminate(&mut self) -> Option<usize> {
        match std::mem::replace(&mut self.state, GroupState::Terminated) {
            GroupState::Accumulating { lines, .. } => Some(lines.len()),
            _ => None,
        }
    }
}

impl Default for GroupingEngine {
    fn default() -> Self {
        Self::new(TimestampFormat::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::timestamp::parse_timestamp;

    fn line(second: u32, body: &str) -> String {
        format!("[2024-03-01 12:00:{:02}][PRICE] {}", second, body)
    }

    fn ts(second: u32) -> Timestamp {
        parse_timestamp(&line(second, "")).unwrap()
    }

    fn feed_all(engine: &mut GroupingEngine, lines: Vec<String>) -> Vec<SpeedMeasurement> {
        lines.into_iter().filter_map(|l| engine.feed(l)).collect()
    }

    #[test]
    fn test_first_line_opens_group_without_emitting() {
        let mut engine = GroupingEngine::default();
        assert!(engine.feed(line(0, "a")).is_none());
        assert_eq!(engine.current_timestamp(), Some(ts(0)));
        assert_eq!(engine.current_group_len(), 1);
    }

    #[test]
    fn test_same_timestamp_accumulates() {
        let mut engine = GroupingEngine::default();
        let emitted = feed_all(&mut engine, vec![line(0, "a"), line(0, "b"), line(0, "c")]);
        assert!(emitted.is_empty());
        assert_eq!(engine.current_group_len(), 3);
    }

    #[test]
    fn test_new_timestamp_emits_previous_group() {
        let mut engine = GroupingEngine::default();
        let emitted = feed_all(
            &mut engine,
            vec![line(0, "a"), line(0, "b"), line(0, "c"), line(1, "d")],
        );
        assert_eq!(
            emitted,
            vec![SpeedMeasurement {
                timestamp: ts(0),
                count: 3
            }]
        );
        assert_eq!(engine.current_timestamp(), Some(ts(1)));
        assert_eq!(engine.current_group_len(), 1);
    }

    #[test]
    fn test_one_line_per_second_emits_n_minus_one() {
        let mut engine = GroupingEngine::default();
        let lines: Vec<String> = (0..10).map(|s| line(s, "x")).collect();
        let emitted = feed_all(&mut engine, lines);
        assert_eq!(emitted.len(), 9);
        assert!(emitted.iter().all(|m| m.count == 1));
    }

    #[test]
    fn test_unparseable_lines_are_ignored() {
        let mut engine = GroupingEngine::default();
        let emitted = feed_all(
            &mut engine,
            vec![
                "Connecting to stream...".to_string(),
                line(0, "a"),
                "heartbeat".to_string(),
                line(0, "b"),
                String::new(),
                line(1, "c"),
            ],
        );
        assert_eq!(
            emitted,
            vec![SpeedMeasurement {
                timestamp: ts(0),
                count: 2
            }]
        );
        assert_eq!(engine.lines_seen(), 6);
        assert_eq!(engine.lines_skipped(), 3);
    }

    #[test]
    fn test_out_of_order_timestamp_starts_new_group() {
        let mut engine = GroupingEngine::default();
        let emitted = feed_all(
            &mut engine,
            vec![line(0, "a"), line(1, "b"), line(0, "c"), line(0, "d"), line(2, "e")],
        );
        assert_eq!(
            emitted,
            vec![
                SpeedMeasurement { timestamp: ts(0), count: 1 },
                SpeedMeasurement { timestamp: ts(1), count: 1 },
                SpeedMeasurement { timestamp: ts(0), count: 2 },
            ]
        );
    }

    #[test]
    fn test_initialize_finds_first_parseable_line() {
        let mut engine = GroupingEngine::default();
        let lines = vec!["noise".to_string(), "more noise".to_string(), line(5, "a"), line(5, "b")];
        assert_eq!(engine.initialize(&lines).unwrap(), Some(2));
        assert_eq!(engine.current_timestamp(), Some(ts(5)));
        assert_eq!(engine.current_group_len(), 1);
        assert_eq!(engine.lines_skipped(), 2);
    }

    #[test]
    fn test_initialize_without_timestamp_stays_uninitialized() {
        let mut engine = GroupingEngine::default();
        let lines = vec!["noise".to_string()];
        assert_eq!(engine.initialize(&lines).unwrap(), None);
        assert!(!engine.is_initialized());
        assert_eq!(engine.state(), &GroupState::Uninitialized);
    }

    #[test]
    fn test_initialize_twice_is_invalid_state() {
        let mut engine = GroupingEngine::default();
        engine.initialize(&[line(0, "a")]).unwrap();
        let err = engine.initialize(&[line(1, "b")]).unwrap_err();
        assert!(matches!(err, MonitorError::InvalidState(_)));
    }

    #[test]
    fn test_terminate_discards_partial_group() {
        let mut engine = GroupingEngine::default();
        feed_all(&mut engine, vec![line(0, "a"), line(0, "b")]);
        assert_eq!(engine.terminate(), Some(2));
        assert!(engine.is_terminated());
        assert!(engine.feed(line(1, "c")).is_none());
        assert!(engine.drain().is_none());
    }

    #[test]
    fn test_drain_emits_partial_group() {
        let mut engine = GroupingEngine::default();
        feed_all(&mut engine, vec![line(0, "a"), line(0, "b")]);
        assert_eq!(
            engine.drain(),
            Some(SpeedMeasurement {
                timestamp: ts(0),
                count: 2
            })
        );
        assert!(!engine.is_initialized());
        assert!(engine.drain().is_none());
    }
}
