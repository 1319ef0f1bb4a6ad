use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::Span,
    widgets::{Paragraph, Wrap},
    Frame,
};

use super::util::{centered_rect, render_overlay_frame};

const OVERLAY_WIDTH: u16 = 48;

pub fn render_error_overlay(frame: &mut Frame, message: &str) {
    let inner_width = OVERLAY_WIDTH.saturating_sub(6) as usize;
    let msg_lines = message.len().div_ceil(inner_width.max(1)).max(1);

    // pad, message, pad, hint, pad, borders
    let content_height = (msg_lines + 4) as u16 + 2;
    let overlay_height = content_height.min(frame.area().height.saturating_sub(4));
    let overlay_area = centered_rect(frame.area(), OVERLAY_WIDTH, overlay_height);
    let inner = render_overlay_frame(frame, overlay_area, " Error ", Color::Red);

    let rows = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(msg_lines as u16),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .split(inner);

    let msg = Paragraph::new(Span::styled(message, Style::default().fg(Color::Red)))
        .wrap(Wrap { trim: true });
    frame.render_widget(msg, indented(rows[1]));

    let hint = Paragraph::new(Span::styled(
        "Press any key to dismiss",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(hint, indented(rows[3]));
}

fn indented(area: Rect) -> Rect {
    Rect {
        x: area.x + 2,
        width: area.width.saturating_sub(4),
        ..area
    }
}
