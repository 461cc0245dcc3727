//! # tailspeed
//!
//! A live rate monitor for timestamped log files.
//!
//! tailspeed follows a growing log, groups consecutive lines that share a
//! second-resolution timestamp, and reports one lines-per-second
//! measurement each time the timestamp changes. The last 60 measurements
//! are kept for trailing averages, shown either as plain records or in an
//! interactive terminal dashboard.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Binary                              │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌──────────┐  │
//! │  │ monitor │───▶│ handoff  │───▶│   app   │───▶│    ui    │  │
//! │  │ (thread)│    │ (bounded)│    │ (state) │    │(ratatui) │  │
//! │  └────┬────┘    └──────────┘    └─────────┘    └──────────┘  │
//! │       │              └─────────▶ output (--plain)            │
//! │       ▼                                                      │
//! │  ┌─────────┐                                                 │
//! │  │ source  │◀── FileSource | StreamSource | ChannelSource    │
//! │  │ (input) │                                                 │
//! │  └─────────┘                                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: live byte sources ([`LiveSource`] trait) for files,
//!   async streams and channels
//! - **[`monitor`]**: chunked reading, timestamp extraction, grouping, the
//!   sliding window and the driver loop
//! - **[`config`]**: layered settings (defaults, TOML, environment)
//! - **[`output`]**: text, JSON and CSV reporters for `--plain`
//! - **[`app`]** / **[`ui`]**: the dashboard
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Dashboard over a growing log
//! tailspeed /var/log/feed.log
//!
//! # One CSV row per second from stdin
//! tail -f feed.log | tailspeed - --plain --format csv
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use tailspeed::{Monitor, MonitorConfig};
//!
//! let mut monitor = Monitor::follow_file("feed.log", MonitorConfig::default())?;
//! monitor.run_with(|session, m| {
//!     println!("{} {} lines/sec, avg {:.2}", m.timestamp, m.count, session.average_speed(60));
//! })?;
//! # Ok::<(), tailspeed::MonitorError>(())
//! ```
//!
//! ### Stopping from another thread
//!
//! ```
//! use std::thread;
//! use tailspeed::{ChannelSource, Monitor, MonitorConfig};
//!
//! let (_tx, source) = ChannelSource::create("example");
//! let mut monitor = Monitor::new(source, MonitorConfig::default());
//! let handle = monitor.handle();
//!
//! let worker = thread::spawn(move || monitor.run());
//! handle.stop();
//! let summary = worker.join().unwrap().unwrap();
//! assert!(summary.stopped);
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod logging;
pub mod monitor;
pub mod output;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::{Clock, MonitorConfig};
pub use data::{HealthStatus, Thresholds};
pub use error::{MonitorError, ParseError};
pub use monitor::{
    Monitor, MonitorHandle, RunSummary, Session, SpeedMeasurement, SpeedWindow, TimestampFormat,
};
pub use output::{OutputFormat, Reporter};
pub use source::{ChannelSource, FileSource, LiveSource, StreamSource};
