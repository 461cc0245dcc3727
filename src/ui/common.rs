//! Common UI components: header bar, status bar and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::duration::format_duration;

/// Render the header bar with feed health and current speed.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let health = app.health();
    let status_style = app.theme.status_style(health);

    let mut spans = vec![
        Span::styled(" ● ", status_style),
        Span::styled("TAILSPEED ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(health.symbol(), status_style),
        Span::raw(" │ "),
    ];

    match app.latest {
        Some(update) => {
            spans.push(Span::styled(
                format!("{}", update.measurement.count),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(" lines/sec", app.theme.muted));
        }
        None => spans.push(Span::styled("waiting for first timestamp", app.theme.muted)),
    }

    spans.push(Span::raw(" │ avg "));
    spans.push(Span::styled(
        format!("{:.2}", app.average_speed()),
        Style::default().fg(app.theme.highlight),
    ));
    spans.push(Span::styled(format!(" ({}s)", app.average_interval), app.theme.muted));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the status bar at the bottom.
///
/// Temporary status messages take precedence over the regular line.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let freshness = match (&app.finished, app.silence()) {
        (Some(Err(e)), _) => format!("Monitor failed: {}", e),
        (Some(Ok(_)), _) => "Source ended".to_string(),
        (None, Some(silence)) => format!("Updated {} ago", format_duration(silence)),
        (None, None) => "No measurements yet".to_string(),
    };

    let dropped = match app.dropped_updates() {
        0 => String::new(),
        n => format!(" | {} dropped", n),
    };

    let status = format!(
        " {} | {}{} | [/]:interval e:export ?:help q:quit",
        app.source_description(),
        freshness,
        dropped,
    );

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay as a centered modal.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(" Measurements", bold)]),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  Home/End    Newest/oldest"),
        Line::from(""),
        Line::from(vec![Span::styled(" Average", bold)]),
        Line::from("  [           Shorter interval"),
        Line::from("  ]           Longer interval"),
        Line::from(""),
        Line::from(vec![Span::styled(" General", bold)]),
        Line::from("  e           Export window to JSON"),
        Line::from("  ?           Toggle help"),
        Line::from("  q Esc       Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 40u16.min(area.width.saturating_sub(4));
    let help_height = 18u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
