//! Bounded handoff between the monitor loop and a slow consumer.
//!
//! The speed-update callback runs on the monitor thread, so anything slow
//! in it stalls ingestion. [`bounded`] gives the loop a callback that only
//! does a non-blocking send; updates that do not fit are dropped and
//! counted instead of blocking the reader.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

use super::driver::Session;
use super::grouping::SpeedMeasurement;

/// A measurement together with the trailing average at emission time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedUpdate {
    #[serde(flatten)]
    pub measurement: SpeedMeasurement,
    pub average: f64,
}

/// Monitor-side end of the handoff.
#[derive(Debug)]
pub struct HandoffObserver {
    sender: mpsc::Sender<SpeedUpdate>,
    dropped: Arc<AtomicU64>,
    average_interval: u64,
}

impl HandoffObserver {
    /// Forward one measurement without blocking.
    ///
    /// Stops the session once the receiving end is gone.
    pub fn observe(&mut self, session: &Session<'_>, measurement: &SpeedMeasurement) {
        let update = SpeedUpdate {
            measurement: *measurement,
            average: session.average_speed(self.average_interval),
        };

        match self.sender.try_send(update) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(dropped, "Consumer lagging, speed update dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => session.stop(),
        }
    }
}

/// Consumer-side end of the handoff.
#[derive(Debug)]
pub struct HandoffReceiver {
    receiver: mpsc::Receiver<SpeedUpdate>,
    dropped: Arc<AtomicU64>,
}

impl HandoffReceiver {
    /// Take every update currently queued, oldest first.
    pub fn drain(&mut self) -> Vec<SpeedUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = self.receiver.try_recv() {
            updates.push(update);
        }
        updates
    }

    /// Wait for the next update. Returns `None` once the monitor is gone.
    pub async fn recv(&mut self) -> Option<SpeedUpdate> {
        self.receiver.recv().await
    }

    /// Updates discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Create a handoff queue holding at most `capacity` updates. Averages are
/// computed over `average_interval` seconds.
pub fn bounded(capacity: usize, average_interval: u64) -> (HandoffObserver, HandoffReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        HandoffObserver {
            sender,
            dropped: dropped.clone(),
            average_interval,
        },
        HandoffReceiver { receiver, dropped },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::monitor::Monitor;
    use crate::source::ChannelSource;

    fn feed(seconds: &[u32]) -> ChannelSource {
        let (tx, source) = ChannelSource::create("test");
        let input: String = seconds
            .iter()
            .map(|s| format!("[2024-03-01 12:00:{:02}] x\n", s))
            .collect();
        tx.try_send(input.into_bytes()).unwrap();
        source
    }

    #[test]
    fn test_updates_arrive_in_emission_order() {
        let (mut observer, mut receiver) = bounded(16, 60);
        let mut monitor = Monitor::new(feed(&[0, 0, 1, 2, 2, 2, 3]), MonitorConfig::default());

        monitor.run_with(|s, m| observer.observe(s, m)).unwrap();

        let counts: Vec<usize> = receiver.drain().iter().map(|u| u.measurement.count).collect();
        assert_eq!(counts, vec![2, 1, 3]);
        assert_eq!(receiver.dropped(), 0);
    }

    #[test]
    fn test_full_queue_drops_instead_of_blocking() {
        let (mut observer, mut receiver) = bounded(2, 60);
        let mut monitor = Monitor::new(feed(&[0, 1, 2, 3, 4, 5]), MonitorConfig::default());

        monitor.run_with(|s, m| observer.observe(s, m)).unwrap();

        assert_eq!(receiver.drain().len(), 2);
        assert_eq!(receiver.dropped(), 3);
    }

    #[test]
    fn test_closed_receiver_stops_session() {
        let (mut observer, receiver) = bounded(4, 60);
        drop(receiver);
        let mut monitor = Monitor::new(feed(&[0, 1, 2, 3]), MonitorConfig::default());

        let summary = monitor.run_with(|s, m| observer.observe(s, m)).unwrap();
        assert!(summary.stopped);
        assert_eq!(summary.measurements, 1);
    }

    #[test]
    fn test_update_serializes_flat() {
        let update = SpeedUpdate {
            measurement: SpeedMeasurement {
                timestamp: chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap(),
                count: 4,
            },
            average: 2.5,
        };
        let json = serde_json::to_value(update).unwrap();
        assert_eq!(json["count"], 4);
        assert_eq!(json["average"], 2.5);
        assert_eq!(json["timestamp"], "2024-03-01T12:00:00");
    }
}
