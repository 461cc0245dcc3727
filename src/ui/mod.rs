//! Terminal rendering.

pub mod common;
pub mod dashboard;
pub mod theme;

pub use theme::Theme;
