//! Main UI layout and rendering.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::art::LoadState;

pub mod components;

pub use components::*;

/// Lines of the screen not available to the queue panel (status bar and borders).
pub const CHROME_HEIGHT: u16 = 3;

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Main layout: [queue] [status]
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    render_queue(
        frame,
        main_chunks[0],
        &mut app.queue,
        &app.rows,
        &app.cache,
        &mut app.thumbnails,
    );
    render_status(frame, main_chunks[1], app);

    if app.show_help {
        render_help(frame, area);
    }

    if let Some(ref error) = app.error_message {
        render_error(frame, area, error);
    }
}

/// Render the status bar.
fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let loaded = app
        .rows
        .iter()
        .filter(|row| row.art.state() == LoadState::Loaded)
        .count();
    let loading = app
        .rows
        .iter()
        .filter(|row| row.art.state() == LoadState::Loading)
        .count();

    let device = if app.device.host.is_empty() {
        String::from("no device")
    } else {
        app.device.base_url()
    };

    let separator = Span::styled(" │ ", Style::default().fg(Color::DarkGray));
    let mut spans = vec![
        Span::styled(device, Style::default().fg(Color::Cyan)),
        separator.clone(),
        Span::raw(format!("art {}/{}", loaded, app.rows.len())),
    ];
    if loading > 0 {
        spans.push(Span::styled(
            format!(" ({} loading)", loading),
            Style::default().fg(Color::Yellow),
        ));
    }
    spans.push(separator.clone());
    spans.push(Span::raw(format!(
        "{} fetches, {} cached",
        app.pipeline.started(),
        app.cache.len()
    )));
    if let Some(status) = &app.status {
        spans.push(separator.clone());
        spans.push(Span::styled(status.as_str(), Style::default().fg(Color::Green)));
    }
    spans.push(separator);
    spans.push(Span::styled("? help", Style::default().fg(Color::DarkGray)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the help overlay.
fn render_help(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
    };

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        section("Navigation"),
        Line::from("  j/k or ↑/↓    Move up/down"),
        Line::from("  g/G Home/End  Jump to top/bottom"),
        Line::from("  Ctrl+d/u      Scroll half page down/up"),
        Line::from(""),
        section("Queue"),
        Line::from("  Enter         Go to selected track"),
        Line::from("  d/Delete      Remove selected from queue"),
        Line::from("  R             Reload queue"),
        Line::from(""),
        section("Other"),
        Line::from("  ?             Show this help"),
        Line::from("  x             Clear error message"),
        Line::from("  q             Quit"),
        Line::from(""),
        section("Mouse"),
        Line::from("  Scroll        Scroll the queue"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or ? to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Help")
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}

/// Render an error message overlay.
fn render_error(frame: &mut Frame, area: Rect, message: &str) {
    // Create a centered popup
    let popup_area = centered_rect(60, 20, area);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Error (x to dismiss)")
        .border_style(Style::default().fg(Color::Red));

    let paragraph = Paragraph::new(message)
        .style(Style::default().fg(Color::Red))
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, popup_area);
}

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
