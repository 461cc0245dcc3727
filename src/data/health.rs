//! Feed health computed from how long ago the last measurement arrived.

use std::time::Duration;

/// Thresholds for health status computation.
///
/// A log feed that stops producing measurements is the failure this tool
/// exists to catch, so health is driven purely by staleness.
#[derive(Debug, Clone)]
pub struct Thresholds {
    /// Silence after which the feed is flagged as a warning.
    pub stall_warning: Duration,
    /// Silence after which the feed is flagged as critical.
    pub stall_critical: Duration,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            stall_warning: Duration::from_secs(5),
            stall_critical: Duration::from_secs(30),
        }
    }
}

/// Health status of the monitored feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Classify a silence duration. `None` means nothing has arrived yet.
    pub fn from_silence(silence: Option<Duration>, thresholds: &Thresholds) -> Self {
        match silence {
            None => HealthStatus::Warning,
            Some(d) if d >= thresholds.stall_critical => HealthStatus::Critical,
            Some(d) if d >= thresholds.stall_warning => HealthStatus::Warning,
            Some(_) => HealthStatus::Healthy,
        }
    }

    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "OK",
            HealthStatus::Warning => "WARN",
            HealthStatus::Critical => "STALL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_from_silence() {
        let t = Thresholds::default();
        assert_eq!(HealthStatus::from_silence(None, &t), HealthStatus::Warning);
        assert_eq!(
            HealthStatus::from_silence(Some(Duration::from_secs(1)), &t),
            HealthStatus::Healthy
        );
        assert_eq!(
            HealthStatus::from_silence(Some(Duration::from_secs(5)), &t),
            HealthStatus::Warning
        );
        assert_eq!(
            HealthStatus::from_silence(Some(Duration::from_secs(31)), &t),
            HealthStatus::Critical
        );
    }

    #[test]
    fn test_health_ordering() {
        assert!(HealthStatus::Healthy < HealthStatus::Warning);
        assert!(HealthStatus::Warning < HealthStatus::Critical);
    }
}
