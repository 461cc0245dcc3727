//! Monitor driver: owns the read → extract → group → emit loop.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::chunk::{Chunk, ChunkReader};
use super::grouping::{GroupingEngine, SpeedMeasurement};
use super::timestamp::Timestamp;
use super::window::SpeedWindow;
use crate::config::{Clock, MonitorConfig};
use crate::error::{MonitorError, Result};
use crate::source::{FileSource, LiveSource};

/// View of the session handed to the speed-update callback.
pub struct Session<'a> {
    window: &'a SpeedWindow,
    stop: &'a AtomicBool,
    clock: Clock,
    description: &'a str,
}

impl Session<'_> {
    /// Trailing average over `interval_secs`, measured against the
    /// session clock.
    pub fn average_speed(&self, interval_secs: u64) -> f64 {
        self.window.average_over(interval_secs, self.clock.now())
    }

    /// Trailing average against a caller-supplied `now`.
    pub fn average_speed_at(&self, interval_secs: u64, now: Timestamp) -> f64 {
        self.window.average_over(interval_secs, now)
    }

    /// The window, already including the measurement being reported.
    pub fn window(&self) -> &SpeedWindow {
        self.window
    }

    /// Request the session to stop. No further callbacks are made.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Description of the followed source.
    pub fn source_description(&self) -> &str {
        self.description
    }
}

/// Thread-safe handle to a running session.
///
/// Cloneable; every clone controls the same session.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    window: Arc<RwLock<SpeedWindow>>,
    stop: Arc<AtomicBool>,
    clock: Clock,
}

impl MonitorHandle {
    /// Ask the session to stop. The loop terminates its source the next
    /// time it checks, without emitting the group in progress.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Trailing average over `interval_secs` against the session clock.
    pub fn average_speed(&self, interval_secs: u64) -> f64 {
        self.window.read().average_over(interval_secs, self.clock.now())
    }

    /// Copy of the current window.
    pub fn window(&self) -> SpeedWindow {
        self.window.read().clone()
    }
}

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Measurements emitted into the window.
    pub measurements: u64,
    /// Lines handed to the grouping engine.
    pub lines_seen: u64,
    /// Lines dropped for lacking a timestamp.
    pub lines_skipped: u64,
    /// Size of the group discarded at exit, if one was in progress.
    pub dropped_partial: Option<usize>,
    /// Whether the loop exited because of a stop request.
    pub stopped: bool,
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    SourceEnded,
    Stopped,
}

/// One monitoring session over one live source.
///
/// # Example
///
/// ```
/// use tailspeed::{ChannelSource, Monitor, MonitorConfig};
///
/// let (tx, source) = ChannelSource::create("example");
/// tx.try_send(b"[2024-01-01 00:00:00] a\n[2024-01-01 00:00:00] b\n[2024-01-01 00:00:01] c\n".to_vec())
///     .unwrap();
/// drop(tx);
///
/// let mut monitor = Monitor::new(source, MonitorConfig::default());
/// let mut counts = Vec::new();
/// monitor.run_with(|_session, m| counts.push(m.count)).unwrap();
/// assert_eq!(counts, vec![2]);
/// ```
#[derive(Debug)]
pub struct Monitor<S> {
    reader: ChunkReader<S>,
    engine: GroupingEngine,
    window: Arc<RwLock<SpeedWindow>>,
    stop: Arc<AtomicBool>,
    config: MonitorConfig,
    description: String,
}

impl Monitor<FileSource> {
    /// Follow newly appended lines of the file at `path`.
    pub fn follow_file<P: AsRef<Path>>(path: P, config: MonitorConfig) -> Result<Self> {
        let source = FileSource::open(path)?;
        Ok(Self::new(source, config))
    }
}

impl<S: LiveSource> Monitor<S> {
    pub fn new(source: S, config: MonitorConfig) -> Self {
        let description = source.description().to_string();
        Self {
            reader: ChunkReader::new(source, config.chunk_size),
            engine: GroupingEngine::new(config.timestamp.clone()),
            window: Arc::new(RwLock::new(SpeedWindow::new(config.window_capacity))),
            stop: Arc::new(AtomicBool::new(false)),
            config,
            description,
        }
    }

    /// Handle for stopping the session and querying averages from other
    /// threads.
    pub fn handle(&self) -> MonitorHandle {
        MonitorHandle {
            window: self.window.clone(),
            stop: self.stop.clone(),
            clock: self.config.clock,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn source_description(&self) -> &str {
        &self.description
    }

    /// Trailing average over `interval_secs` against the session clock.
    pub fn average_speed(&self, interval_secs: u64) -> f64 {
        self.window.read().average_over(interval_secs, self.config.clock.now())
    }

    /// Terminate the source immediately. A running loop exits at its next
    /// check without emitting the group in progress.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.reader.source_mut().terminate();
    }

    /// Run until the source ends or a stop is requested, storing every
    /// measurement without reporting it.
    pub fn run(&mut self) -> Result<RunSummary> {
        self.run_with(|_, _| {})
    }

    /// Run until the source ends or a stop is requested.
    ///
    /// `on_update` is called synchronously on this thread, after the
    /// measurement has been appended to the window, in emission order. A
    /// slow callback stalls ingestion; use
    /// [`handoff::bounded`](super::handoff::bounded) to decouple slow
    /// consumers.
    pub fn run_with<F>(&mut self, mut on_update: F) -> Result<RunSummary>
    where
        F: FnMut(&Session<'_>, &SpeedMeasurement),
    {
        info!(source = %self.description, "Monitoring started");
        let mut summary = RunSummary::default();

        let exit = self.run_loop(&mut on_update, &mut summary)?;

        if exit == Exit::SourceEnded && self.config.flush_on_close {
            if let Some(measurement) = self.engine.drain() {
                debug!(?measurement, "Flushing group in progress");
                self.emit(measurement, &mut on_update, &mut summary);
            }
        }

        self.reader.source_mut().terminate();
        summary.dropped_partial = self.engine.terminate();
        summary.lines_seen = self.engine.lines_seen();
        summary.lines_skipped = self.engine.lines_skipped();
        summary.stopped = exit == Exit::Stopped;

        info!(
            source = %self.description,
            measurements = summary.measurements,
            lines = summary.lines_seen,
            skipped = summary.lines_skipped,
            stopped = summary.stopped,
            "Monitoring finished"
        );
        Ok(summary)
    }

    fn run_loop(
        &mut self,
        on_update: &mut dyn FnMut(&Session<'_>, &SpeedMeasurement),
        summary: &mut RunSummary,
    ) -> Result<Exit> {
        loop {
            if let Some(exit) = self.check_liveness() {
                return Ok(exit);
            }

            let lines = if self.engine.is_initialized() {
                match self.reader.next_chunk()? {
                    Chunk::EndOfStream => return Ok(Exit::SourceEnded),
                    Chunk::Idle => {
                        thread::sleep(self.config.poll_interval);
                        continue;
                    }
                    Chunk::Lines(lines) => lines,
                }
            } else {
                match self.initialize_timestamp()? {
                    Ok(rest) => rest,
                    Err(exit) => return Ok(exit),
                }
            };

            for line in lines {
                if self.stop_requested() {
                    return Ok(Exit::Stopped);
                }
                if let Some(measurement) = self.engine.feed(line) {
                    if !self.emit(measurement, on_update, summary) {
                        return Ok(Exit::Stopped);
                    }
                }
            }
        }
    }

    /// Read chunks until a line opens the first group.
    ///
    /// Returns the lines of that chunk following the opening line, or the
    /// reason the search ended.
    fn initialize_timestamp(&mut self) -> Result<std::result::Result<Vec<String>, Exit>> {
        let mut retries = 0u64;

        loop {
            if let Some(exit) = self.check_liveness() {
                return Ok(Err(exit));
            }

            let lines = match self.reader.next_chunk()? {
                Chunk::EndOfStream => return Ok(Err(Exit::SourceEnded)),
                Chunk::Idle => {
                    thread::sleep(self.config.poll_interval);
                    continue;
                }
                // Bytes arrived without a terminator; read again at once
                Chunk::Lines(lines) if lines.is_empty() => continue,
                Chunk::Lines(lines) => lines,
            };

            if let Some(index) = self.engine.initialize(&lines)? {
                info!(
                    timestamp = ?self.engine.current_timestamp(),
                    skipped = self.engine.lines_skipped(),
                    "First timestamp found"
                );
                return Ok(Ok(lines.into_iter().skip(index + 1).collect()));
            }

            retries += 1;
            if let Some(max) = self.config.max_init_retries {
                if retries >= max {
                    warn!(retries, "Giving up on the initial timestamp search");
                    return Err(MonitorError::InitRetriesExhausted { retries });
                }
            }
        }
    }

    /// Append to the window, then report. Returns `false` if a stop was
    /// requested, in which case the callback is not invoked.
    fn emit(
        &mut self,
        measurement: SpeedMeasurement,
        on_update: &mut dyn FnMut(&Session<'_>, &SpeedMeasurement),
        summary: &mut RunSummary,
    ) -> bool {
        self.window.write().append(measurement);
        summary.measurements += 1;
        debug!(timestamp = %measurement.timestamp, count = measurement.count, "Speed measurement");

        if self.stop_requested() {
            return false;
        }

        let window = self.window.read();
        let session = Session {
            window: &window,
            stop: &self.stop,
            clock: self.config.clock,
            description: &self.description,
        };
        on_update(&session, &measurement);
        true
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Checked before every read.
    fn check_liveness(&mut self) -> Option<Exit> {
        if self.stop_requested() {
            self.reader.source_mut().terminate();
            return Some(Exit::Stopped);
        }
        if !self.reader.source().is_alive() {
            return Some(Exit::SourceEnded);
        }
        None
    }
}
