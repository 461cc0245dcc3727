//! Bounded trailing history of speed measurements.

use std::collections::VecDeque;

use chrono::TimeDelta;

use super::grouping::SpeedMeasurement;
use super::timestamp::Timestamp;

/// Default number of measurements kept.
pub const DEFAULT_WINDOW_CAPACITY: usize = 60;

/// Fixed-capacity FIFO of the most recent measurements.
///
/// Insertion order is emission order; timestamps are not required to be
/// monotonic.
#[derive(Debug, Clone)]
pub struct SpeedWindow {
    capacity: usize,
    entries: VecDeque<SpeedMeasurement>,
}

impl Default for SpeedWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

impl SpeedWindow {
    /// Create an empty window. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a measurement, evicting the oldest when full.
    pub fn append(&mut self, measurement: SpeedMeasurement) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(measurement);
    }

    /// Mean count of the trailing measurements within `interval_secs` of
    /// `now`.
    ///
    /// Scans newest to oldest and stops at the first measurement outside
    /// the interval, so an older measurement behind a gap is never counted.
    /// Returns `0.0` when nothing qualifies.
    pub fn average_over(&self, interval_secs: u64, now: Timestamp) -> f64 {
        // None: the interval exceeds what TimeDelta can express
        let limit = i64::try_from(interval_secs).ok().and_then(TimeDelta::try_seconds);

        let mut total = 0usize;
        let mut samples = 0usize;
        for measurement in self.entries.iter().rev() {
            let within = match limit {
                Some(limit) => now - measurement.timestamp <= limit,
                None => true,
            };
            if !within {
                break;
            }
            total += measurement.count;
            samples += 1;
        }

        if samples == 0 {
            0.0
        } else {
            total as f64 / samples as f64
        }
    }

    /// Most recently appended measurement.
    pub fn latest(&self) -> Option<&SpeedMeasurement> {
        self.entries.back()
    }

    /// Measurements from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SpeedMeasurement> + '_ {
        self.entries.iter()
    }

    /// Counts from oldest to newest, for sparklines.
    pub fn counts(&self) -> Vec<u64> {
        self.entries.iter().map(|m| m.count as u64).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
