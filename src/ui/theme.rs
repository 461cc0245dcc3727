//! Dashboard colors.
//!
//! Two palettes, picked from the terminal background. Health colors follow
//! feed staleness; the rate colors mark measurements against the trailing
//! average.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::HealthStatus;

#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent for the average, status messages and the help frame.
    pub highlight: Color,
    pub healthy: Color,
    pub warning: Color,
    pub critical: Color,
    pub border: Color,
    /// Table header rows.
    pub header: Style,
    /// Selected measurement row.
    pub selected: Style,
    /// Sparkline and per-row bars.
    pub sparkline: Style,
    /// Labels and units next to values.
    pub muted: Style,
    /// Measurement at or above the trailing average.
    pub above_average: Color,
    /// Measurement below the trailing average.
    pub below_average: Color,
    pub border_type: BorderType,
}

impl Theme {
    /// Palette for dark backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::LightCyan,
            healthy: Color::Green,
            warning: Color::Yellow,
            critical: Color::LightRed,
            border: Color::DarkGray,
            header: Style::default().fg(Color::LightCyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            sparkline: Style::default().fg(Color::LightGreen),
            muted: Style::default().fg(Color::Gray),
            above_average: Color::LightGreen,
            below_average: Color::LightMagenta,
            border_type: BorderType::Rounded,
        }
    }

    /// Palette for light backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            healthy: Color::Green,
            warning: Color::Rgb(176, 112, 0),
            critical: Color::Red,
            border: Color::Gray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            sparkline: Style::default().fg(Color::Green),
            muted: Style::default().fg(Color::DarkGray),
            above_average: Color::Green,
            below_average: Color::Magenta,
            border_type: BorderType::Plain,
        }
    }

    /// Pick a palette from the terminal's background luminance. Falls back
    /// to the dark palette when the terminal does not answer.
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Style for the feed health indicator. A stalled feed is bold.
    pub fn status_style(&self, status: HealthStatus) -> Style {
        match status {
            HealthStatus::Healthy => Style::default().fg(self.healthy),
            HealthStatus::Warning => Style::default().fg(self.warning),
            HealthStatus::Critical => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
        }
    }

    /// Style for a measurement's distance from the trailing average.
    pub fn rate_style(&self, delta: f64) -> Style {
        if delta < 0.0 {
            Style::default().fg(self.below_average)
        } else {
            Style::default().fg(self.above_average)
        }
    }
}
