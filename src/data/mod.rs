//! Supporting data helpers for the monitor and the dashboard.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "5s", "100ms")
//! - [`health`]: Feed health ([`HealthStatus`]) derived from [`Thresholds`]

pub mod duration;
pub mod health;

pub use health::{HealthStatus, Thresholds};
