//! Dashboard view.
//!
//! Shows rate statistics, a sparkline of the window, and the recent
//! measurements newest first.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Width of the inline bar in the measurements table.
const BAR_WIDTH: usize = 20;

/// Render the dashboard into `area`.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(4), // Stats
        Constraint::Length(3), // Sparkline
        Constraint::Min(4),    // Measurements
    ])
    .split(area);

    render_stats(frame, app, chunks[0]);
    render_sparkline(frame, app, chunks[1]);
    render_measurements(frame, app, chunks[2]);
}

fn block<'a>(app: &App, title: String) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let current = app
        .latest
        .map(|u| u.measurement.count.to_string())
        .unwrap_or_else(|| "-".to_string());
    let last_timestamp = app
        .latest
        .map(|u| u.measurement.timestamp.to_string())
        .unwrap_or_else(|| "-".to_string());

    let lines = vec![
        Line::from(vec![
            Span::styled(" Current ", app.theme.muted),
            Span::styled(current, bold),
            Span::styled("   Average ", app.theme.muted),
            Span::styled(format!("{:.2}", app.average_speed()), bold),
            Span::styled(format!(" ({}s)", app.average_interval), app.theme.muted),
            Span::styled("   Peak ", app.theme.muted),
            Span::styled(app.peak_speed().to_string(), bold),
        ]),
        Line::from(vec![
            Span::styled(" Last ", app.theme.muted),
            Span::raw(last_timestamp),
            Span::styled("   Window ", app.theme.muted),
            Span::raw(format!("{}/{}", app.window.len(), app.window.capacity())),
            Span::styled("   Updates ", app.theme.muted),
            Span::raw(app.total_updates.to_string()),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block(app, " Rate ".to_string())), area);
}

fn render_sparkline(frame: &mut Frame, app: &App, area: Rect) {
    let counts = app.window.counts();

    // Show the most recent values that fit inside the borders
    let visible = area.width.saturating_sub(2) as usize;
    let start = counts.len().saturating_sub(visible);
    let shown = &counts[start..];

    let paragraph = Paragraph::new(render_sparkline_chars(shown))
        .style(app.theme.sparkline)
        .block(block(app, format!(" Lines/sec (last {}) ", shown.len())));

    frame.render_widget(paragraph, area);
}

fn render_measurements(frame: &mut Frame, app: &App, area: Rect) {
    let peak = app.peak_speed().max(1);
    let average = app.average_speed();

    let header = Row::new(vec![
        Cell::from("Timestamp"),
        Cell::from("Lines"),
        Cell::from("vs avg"),
        Cell::from(""),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = app
        .window
        .iter()
        .rev()
        .map(|m| {
            let delta = m.count as f64 - average;

            Row::new(vec![
                Cell::from(m.timestamp.to_string()),
                Cell::from(m.count.to_string()),
                Cell::from(format!("{:+.1}", delta)).style(app.theme.rate_style(delta)),
                Cell::from(render_bar(m.count, peak)).style(app.theme.sparkline),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(20),
        Constraint::Length(8),
        Constraint::Length(9),
        Constraint::Fill(1),
    ];

    let selected = app.selected_index.min(app.window.len().saturating_sub(1));
    let position_info = if app.window.is_empty() {
        String::new()
    } else {
        format!(" [{}/{}]", selected + 1, app.window.len())
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(block(app, format!(" Measurements{} ", position_info)))
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !app.window.is_empty() {
        state.select(Some(selected));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

/// One character per value, scaled against the largest value.
fn render_sparkline_chars(values: &[u64]) -> String {
    let max = values.iter().copied().max().unwrap_or(0).max(1);
    values
        .iter()
        .map(|&v| SPARKLINE_CHARS[((v * 7) / max).min(7) as usize])
        .collect()
}

/// Horizontal bar scaled against `peak`.
fn render_bar(count: usize, peak: usize) -> String {
    let filled = (count * BAR_WIDTH).div_ceil(peak.max(1)).min(BAR_WIDTH);
    "█".repeat(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparkline_chars() {
        assert_eq!(render_sparkline_chars(&[]), "");
        assert_eq!(render_sparkline_chars(&[0, 7, 14]), "▁▄█");
        assert_eq!(render_sparkline_chars(&[0, 0]), "▁▁");
    }

    #[test]
    fn test_render_bar_scales_to_peak() {
        assert_eq!(render_bar(0, 10), "");
        assert_eq!(render_bar(10, 10).chars().count(), BAR_WIDTH);
        assert_eq!(render_bar(5, 10).chars().count(), BAR_WIDTH / 2);
        // Never wider than the column
        assert_eq!(render_bar(50, 10).chars().count(), BAR_WIDTH);
        assert_eq!(render_bar(1, 0).chars().count(), BAR_WIDTH);
    }
}
