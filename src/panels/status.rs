use std::time::Duration;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use super::util::panel_block;
use crate::digits::{render_countdown, render_wave, wave_position, COUNTDOWN_MIN_WIDTH, DIGIT_HEIGHT};
use crate::interval::{format_secs, IntervalRange};

/// Snapshot of scheduler state for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView<'a> {
    pub running: bool,
    pub interval: IntervalRange,
    pub outstanding: usize,
    pub queued: usize,
    pub delivered: u64,
    pub next_in: Option<Duration>,
    pub foreground: bool,
    pub last_error: Option<&'a str>,
    pub tick_count: u32,
}

impl StatusView<'_> {
    pub fn headline(&self) -> String {
        if self.running {
            format!("Chiming every {}", self.interval)
        } else {
            "Stopped - press [s] to start".to_string()
        }
    }

    pub fn counts(&self) -> String {
        format!(
            "Scheduled: {}  Queued: {}  Fired: {}",
            self.outstanding, self.queued, self.delivered
        )
    }

    pub fn countdown(&self) -> Option<String> {
        self.next_in
            .filter(|_| self.running)
            .map(|d| format!("Next chime in {}", format_secs(d.as_secs())))
    }
}

#[derive(Default)]
pub struct StatusPanel;

impl StatusPanel {
    pub fn render(&self, frame: &mut Frame, area: Rect, view: &StatusView) {
        let block = panel_block(" Status ", false);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let show_digits = view.running
            && view.next_in.is_some()
            && inner.width >= COUNTDOWN_MIN_WIDTH
            && inner.height as usize >= DIGIT_HEIGHT + 6;

        let chunks = if show_digits {
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(DIGIT_HEIGHT as u16),
                Constraint::Min(0),
            ])
            .split(inner)
        } else {
            Layout::vertical([Constraint::Length(0), Constraint::Length(0), Constraint::Min(0)])
                .split(inner)
        };

        if let (true, Some(next_in)) = (show_digits, view.next_in) {
            let rows: Vec<Line> = render_countdown(next_in.as_secs())
                .into_iter()
                .map(|row| Line::from(Span::styled(row, Style::default().fg(Color::White))))
                .collect();
            frame.render_widget(Paragraph::new(rows).alignment(Alignment::Center), chunks[1]);
        }

        frame.render_widget(
            Paragraph::new(Self::lines(view, show_digits))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            chunks[2],
        );
    }

    fn lines<'a>(view: &StatusView<'a>, digits_shown: bool) -> Vec<Line<'a>> {
        let wave = if view.running {
            render_wave(Some(wave_position(view.tick_count)))
        } else {
            render_wave(None)
        };
        let headline_color = if view.running {
            Color::Green
        } else {
            Color::DarkGray
        };

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(wave, Style::default().fg(Color::Cyan))),
            Line::from(Span::styled(
                view.headline(),
                Style::default()
                    .fg(headline_color)
                    .add_modifier(Modifier::BOLD),
            )),
        ];

        if !digits_shown {
            if let Some(countdown) = view.countdown() {
                lines.push(Line::from(countdown));
            }
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            view.counts(),
            Style::default().fg(Color::Gray),
        )));

        if !view.foreground {
            lines.push(Line::from(Span::styled(
                "In background - chimes continue",
                Style::default().fg(Color::DarkGray),
            )));
        }

        if let Some(err) = view.last_error {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Scheduling error: {err}"),
                Style::default().fg(Color::Red),
            )));
        }

        lines
    }
}
