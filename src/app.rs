//! Dashboard application state.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::data::{HealthStatus, Thresholds};
use crate::monitor::{HandoffReceiver, MonitorHandle, RunSummary, SpeedUpdate, SpeedWindow};
use crate::ui::Theme;

/// Averaging intervals the user can step through, in seconds.
pub const AVERAGE_INTERVALS: &[u64] = &[10, 30, 60, 120, 300];

/// How long a status message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,

    // Monitor connection
    handle: MonitorHandle,
    updates: HandoffReceiver,
    source_description: String,

    /// Copy of the monitor's window, refreshed on every update.
    pub window: SpeedWindow,
    /// Newest update received, with the average computed at emission.
    pub latest: Option<SpeedUpdate>,
    /// Wall time the newest update arrived.
    pub last_update: Option<Instant>,
    pub total_updates: u64,
    /// Set once the monitor thread has exited.
    pub finished: Option<Result<RunSummary, String>>,

    pub average_interval: u64,
    pub thresholds: Thresholds,

    // Navigation state (row in the recent-measurements table)
    pub selected_index: usize,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App fed by `updates` from the session behind `handle`.
    pub fn new(
        handle: MonitorHandle,
        updates: HandoffReceiver,
        source_description: &str,
        average_interval: u64,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            running: true,
            show_help: false,
            window: handle.window(),
            handle,
            updates,
            source_description: source_description.to_string(),
            latest: None,
            last_update: None,
            total_updates: 0,
            finished: None,
            average_interval,
            thresholds,
            selected_index: 0,
            theme: Theme::auto_detect(),
            status_message: None,
        }
    }

    /// Returns a description of the followed source.
    pub fn source_description(&self) -> &str {
        &self.source_description
    }

    /// Pull queued updates from the monitor.
    ///
    /// Returns true if anything new arrived.
    pub fn refresh(&mut self) -> bool {
        let updates = self.updates.drain();
        let Some(newest) = updates.last().copied() else {
            return false;
        };

        self.total_updates += updates.len() as u64;
        self.latest = Some(newest);
        self.last_update = Some(Instant::now());
        self.window = self.handle.window();

        // Keep the selection on the same measurement as rows shift down
        if self.selected_index > 0 {
            self.selected_index =
                (self.selected_index + updates.len()).min(self.window.len().saturating_sub(1));
        }
        true
    }

    /// Trailing average over the selected interval, recomputed now.
    pub fn average_speed(&self) -> f64 {
        self.handle.average_speed(self.average_interval)
    }

    /// Highest count currently in the window.
    pub fn peak_speed(&self) -> usize {
        self.window.iter().map(|m| m.count).max().unwrap_or(0)
    }

    /// Updates the monitor had to drop because the UI lagged.
    pub fn dropped_updates(&self) -> u64 {
        self.updates.dropped()
    }

    /// Time since the last update, or since nothing when none arrived.
    pub fn silence(&self) -> Option<Duration> {
        self.last_update.map(|t| t.elapsed())
    }

    /// Feed health based on how long the feed has been silent.
    pub fn health(&self) -> HealthStatus {
        HealthStatus::from_silence(self.silence(), &self.thresholds)
    }

    /// Record the monitor thread's exit.
    pub fn set_finished(&mut self, outcome: Result<RunSummary, String>) {
        match &outcome {
            Ok(summary) => self.set_status_message(format!(
                "Monitor finished after {} measurements",
                summary.measurements
            )),
            Err(e) => self.set_status_message(format!("Monitor failed: {}", e)),
        }
        self.finished = Some(outcome);
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    /// Step to the next longer averaging interval.
    pub fn grow_interval(&mut self) {
        if let Some(&next) = AVERAGE_INTERVALS.iter().find(|&&i| i > self.average_interval) {
            self.average_interval = next;
        }
    }

    /// Step to the next shorter averaging interval.
    pub fn shrink_interval(&mut self) {
        if let Some(&prev) = AVERAGE_INTERVALS.iter().rev().find(|&&i| i < self.average_interval) {
            self.average_interval = prev;
        }
    }

    /// Move selection down (towards older measurements).
    pub fn select_next(&mut self) {
        let max = self.window.len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max);
    }

    /// Move selection up (towards newer measurements).
    pub fn select_prev(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    /// Jump to the newest measurement.
    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    /// Jump to the oldest measurement.
    pub fn select_last(&mut self) {
        self.selected_index = self.window.len().saturating_sub(1);
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Stop the monitor and signal the application to quit.
    pub fn quit(&mut self) {
        self.handle.stop();
        self.running = false;
    }

    /// Export the current window to a JSON file.
    pub fn export_window(&self, path: &Path) -> Result<()> {
        if self.window.is_empty() {
            anyhow::bail!("No measurements to export");
        }

        let export = serde_json::json!({
            "source": self.source_description,
            "average_interval": self.average_interval,
            "average": self.average_speed(),
            "measurements": self.window.iter().collect::<Vec<_>>(),
        });

        let json = serde_json::to_string_pretty(&export)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::monitor::{handoff, Monitor};
    use crate::source::ChannelSource;

    fn app_with(seconds: &[u32]) -> App {
        let (tx, source) = ChannelSource::create("test");
        let input: String = seconds
            .iter()
            .map(|s| format!("[2024-03-01 12:00:{:02}] x\n", s))
            .collect();
        tx.try_send(input.into_bytes()).unwrap();
        drop(tx);

        let mut monitor = Monitor::new(source, MonitorConfig::default());
        let (mut observer, receiver) = handoff::bounded(64, 60);
        monitor.run_with(|s, m| observer.observe(s, m)).unwrap();

        App::new(monitor.handle(), receiver, "test", 60, Thresholds::default())
    }

    #[test]
    fn test_refresh_pulls_updates() {
        let mut app = app_with(&[0, 0, 1, 2]);
        assert!(app.latest.is_none());
        assert_eq!(app.health(), HealthStatus::Warning);

        assert!(app.refresh());
        assert_eq!(app.total_updates, 2);
        assert_eq!(app.latest.unwrap().measurement.count, 1);
        assert_eq!(app.window.len(), 2);
        assert_eq!(app.peak_speed(), 2);
        assert_eq!(app.health(), HealthStatus::Healthy);

        // Nothing new
        assert!(!app.refresh());
    }

    #[test]
    fn test_interval_steps() {
        let mut app = app_with(&[]);
        assert_eq!(app.average_interval, 60);
        app.grow_interval();
        assert_eq!(app.average_interval, 120);
        app.grow_interval();
        app.grow_interval();
        assert_eq!(app.average_interval, 300);
        app.shrink_interval();
        assert_eq!(app.average_interval, 120);

        app.average_interval = 45;
        app.shrink_interval();
        assert_eq!(app.average_interval, 30);
    }

    #[test]
    fn test_selection_is_clamped() {
        let mut app = app_with(&[0, 1, 2, 3]);
        app.refresh();
        app.select_next();
        app.select_next();
        app.select_next();
        app.select_next();
        assert_eq!(app.selected_index, 2);
        app.select_first();
        assert_eq!(app.selected_index, 0);
        app.select_prev();
        assert_eq!(app.selected_index, 0);
        app.select_last();
        assert_eq!(app.selected_index, 2);
    }

    #[test]
    fn test_quit_stops_monitor() {
        let mut app = app_with(&[]);
        app.quit();
        assert!(!app.running);
        assert!(app.handle.is_stopped());
    }

    #[test]
    fn test_export_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");

        assert!(app_with(&[]).export_window(&path).is_err());
        assert!(!path.exists());

        let app = app_with(&[0, 1, 1, 2]);
        app.export_window(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["source"], "test");
        assert_eq!(json["measurements"].as_array().unwrap().len(), 2);
        assert_eq!(json["measurements"][1]["count"], 2);
    }
}
