//! Monitor configuration.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. built-in defaults ([`MonitorConfig::default`])
//! 2. an optional TOML file
//! 3. `TAILSPEED_*` environment variables (`TAILSPEED_CHUNK_SIZE=8192`,
//!    `TAILSPEED_TIMESTAMP__OFFSET=0`)
//!
//! Command-line flags are applied on top by the binary.
//!
//! ```toml
//! chunk_size = 4096
//! window_capacity = 60
//! poll_interval = "100ms"
//! max_init_retries = 500
//! clock = "utc"
//!
//! [timestamp]
//! offset = 1
//! width = 19
//! pattern = "%Y-%m-%d %H:%M:%S"
//! ```

use std::path::Path;
use std::time::Duration;

use ::config::{Config, Environment, File};
use chrono::{Local, Utc};
use serde::Deserialize;

use crate::data::duration;
use crate::error::{MonitorError, Result};
use crate::monitor::chunk::DEFAULT_CHUNK_SIZE;
use crate::monitor::timestamp::{Timestamp, TimestampFormat};
use crate::monitor::window::DEFAULT_WINDOW_CAPACITY;

/// Environment variable prefix.
const ENV_PREFIX: &str = "TAILSPEED";

/// Wall clock used as "now" for trailing averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clock {
    /// Local wall time. Matches logs stamped in local time.
    #[default]
    Local,
    /// UTC wall time. Matches logs stamped in UTC.
    Utc,
}

impl Clock {
    /// Current time on this clock, without zone.
    pub fn now(&self) -> Timestamp {
        match self {
            Clock::Local => Local::now().naive_local(),
            Clock::Utc => Utc::now().naive_utc(),
        }
    }
}

/// Settings for one monitoring session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Bytes requested per read.
    pub chunk_size: usize,
    /// Measurements kept for trailing averages.
    pub window_capacity: usize,
    /// Sleep after a read that returned no bytes.
    #[serde(deserialize_with = "duration::deserialize")]
    pub poll_interval: Duration,
    /// Chunks without any timestamp tolerated before the first group.
    /// `None` searches indefinitely.
    pub max_init_retries: Option<u64>,
    /// Emit the group in progress when the source ends.
    pub flush_on_close: bool,
    /// Default look-back, in seconds, for reported averages.
    pub average_interval: u64,
    /// Clock used as "now" for averages.
    pub clock: Clock,
    /// Location and pattern of the timestamp in each line.
    pub timestamp: TimestampFormat,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            poll_interval: Duration::from_millis(100),
            max_init_retries: None,
            flush_on_close: false,
            average_interval: 60,
            clock: Clock::Local,
            timestamp: TimestampFormat::default(),
        }
    }
}

impl MonitorConfig {
    /// Load defaults, then `path` (if any), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: MonitorConfig = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the monitor cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(MonitorError::Config("chunk_size must be at least 1".into()));
        }
        if self.window_capacity == 0 {
            return Err(MonitorError::Config("window_capacity must be at least 1".into()));
        }
        if self.timestamp.width == 0 {
            return Err(MonitorError::Config("timestamp.width must be at least 1".into()));
        }
        if self.timestamp.pattern.is_empty() {
            return Err(MonitorError::Config("timestamp.pattern must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.window_capacity, 60);
        assert_eq!(config.max_init_retries, None);
        assert!(!config.flush_on_close);
        assert_eq!(config.clock, Clock::Local);
        assert_eq!(config.timestamp, TimestampFormat::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
            window_capacity = 10
            poll_interval = "250ms"
            max_init_retries = 3
            clock = "utc"

            [timestamp]
            offset = 0
            "#,
        );

        let config = MonitorConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.window_capacity, 10);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.max_init_retries, Some(3));
        assert_eq!(config.clock, Clock::Utc);
        assert_eq!(config.timestamp.offset, 0);
        // Untouched keys keep their defaults
        assert_eq!(config.timestamp.width, 19);
        assert_eq!(config.chunk_size, 4096);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let file = write_config("window_capacity = 0\n");
        let err = MonitorConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));

        let file = write_config("poll_interval = \"soon\"\n");
        assert!(MonitorConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = MonitorConfig::load(Some(Path::new("/nonexistent/tailspeed.toml"))).unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }
}
