use std::time::Instant;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;
use crate::notifications::NotificationCenter;
use crate::overlays::{render_error_overlay, render_help_overlay};

/// Below this width the panels stack instead of sitting side by side.
const SIDE_BY_SIDE_MIN_WIDTH: u16 = 80;

pub struct AppLayout {
    pub controls: Rect,
    pub status: Rect,
    pub footer: Rect,
}

pub fn create_layout(area: Rect) -> AppLayout {
    let [body, footer] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);

    let [controls, status] = if body.width >= SIDE_BY_SIDE_MIN_WIDTH {
        Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(body)
    } else {
        Layout::vertical([Constraint::Length(11), Constraint::Min(0)]).areas(body)
    };

    AppLayout {
        controls,
        status,
        footer,
    }
}

pub fn render<N: NotificationCenter>(frame: &mut Frame, app: &App<N>, now: Instant) {
    let layout = create_layout(frame.area());

    app.controls.render(
        frame,
        layout.controls,
        app.scheduler.interval(),
        app.scheduler.is_running(),
    );
    app.status
        .render(frame, layout.status, &app.status_view(now));
    render_footer(frame, layout.footer);

    if let Some(ref message) = app.error {
        render_error_overlay(frame, message);
    } else if app.help_visible {
        render_help_overlay(frame, &app.shortcuts());
    }
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let footer = Line::from(vec![
        Span::styled(" [s]", key),
        Span::raw(" Start/Stop  "),
        Span::styled("[?]", key),
        Span::raw(" Help  "),
        Span::styled("[q]", key),
        Span::raw(" Quit"),
    ]);
    frame.render_widget(Paragraph::new(footer), area);
}
