//! Error types for the monitor.

use thiserror::Error;

/// A line did not carry a well-formed timestamp at the expected position.
///
/// Never fatal: the line is dropped and the stream continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no timestamp in line: {excerpt:?}")]
pub struct ParseError {
    /// The first few characters of the rejected line.
    pub excerpt: String,
}

impl ParseError {
    const EXCERPT_CHARS: usize = 32;

    pub(crate) fn for_line(line: &str) -> Self {
        Self {
            excerpt: line.chars().take(Self::EXCERPT_CHARS).collect(),
        }
    }
}

/// Errors that stop a monitoring session.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Reading from or opening the live source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration failed to load or validate.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Internal sequencing was violated. Indicates a bug, never user input.
    #[error("Invalid monitor state: {0}")]
    InvalidState(&'static str),

    /// The configured cap on the initial timestamp search was reached.
    #[error("No timestamp found after {retries} chunks")]
    InitRetriesExhausted { retries: u64 },
}

impl From<::config::ConfigError> for MonitorError {
    fn from(err: ::config::ConfigError) -> Self {
        MonitorError::Config(err.to_string())
    }
}

/// Result alias used across the monitor.
pub type Result<T> = std::result::Result<T, MonitorError>;
