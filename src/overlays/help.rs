use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::util::{centered_rect, render_overlay_frame, shortcut_line};
use crate::util::Shortcut;

const GLOBAL_SHORTCUTS: [(&str, &str); 4] = [
    ("s", "Start/Stop Chimes"),
    ("?", "Toggle Help"),
    ("Esc", "Close Overlay"),
    ("q", "Quit"),
];

pub fn render_help_overlay(frame: &mut Frame, shortcuts: &[Shortcut]) {
    let mut lines: Vec<Line> = vec![
        Line::from(""),
        Line::from(Span::styled("  Controls", Style::default().fg(Color::White))),
    ];
    lines.extend(
        shortcuts
            .iter()
            .map(|shortcut| shortcut_line(shortcut.key, shortcut.description)),
    );

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Global",
        Style::default().fg(Color::White),
    )));
    lines.extend(
        GLOBAL_SHORTCUTS
            .iter()
            .map(|(key, desc)| shortcut_line(key, desc)),
    );
    lines.push(Line::from(""));

    let content_height = lines.len() as u16 + 2;
    let overlay_height = content_height.min(frame.area().height.saturating_sub(4));
    let overlay_area = centered_rect(frame.area(), 36, overlay_height);

    let inner = render_overlay_frame(frame, overlay_area, " Help ", Color::Cyan);
    frame.render_widget(Paragraph::new(lines), inner);
}
